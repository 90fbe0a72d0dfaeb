//! LocalStorage 封装模块
//!
//! 会话在页面刷新之间以 JSON 形式保存在 `clubhub.session` 键下。

use clubhub::backend::SessionPersistence;
use clubhub_shared::Session;
use gloo_storage::{LocalStorage, Storage};

pub const SESSION_KEY: &str = "clubhub.session";

/// 浏览器本地存储中的会话
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl SessionPersistence for BrowserStorage {
    fn load(&self) -> Option<Session> {
        match LocalStorage::get::<Session>(SESSION_KEY) {
            Ok(session) => Some(session),
            Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => None,
            Err(e) => {
                // 旧版本或被篡改的数据，直接丢弃
                log::warn!("discarding unreadable stored session: {e}");
                LocalStorage::delete(SESSION_KEY);
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        if let Err(e) = LocalStorage::set(SESSION_KEY, session) {
            log::warn!("could not persist session: {e}");
        }
    }

    fn clear(&self) {
        LocalStorage::delete(SESSION_KEY);
    }
}
