//! 定时器封装模块
//!
//! 周期性检查访问令牌，临近过期时续期。

use chrono::Utc;
use clubhub::REFRESH_MARGIN_SECS;
use clubhub::backend::Backend;
use gloo_timers::callback::Interval;
use leptos::task::spawn_local;
use std::rc::Rc;

/// 检查间隔（毫秒）
const REFRESH_CHECK_MILLIS: u32 = 60_000;

/// Start the token refresh timer. Dropping the returned handle stops it.
pub fn start_token_refresh<B: Backend + 'static>(backend: Rc<B>) -> Interval {
    Interval::new(REFRESH_CHECK_MILLIS, move || {
        let backend = backend.clone();
        spawn_local(async move {
            if let Err(e) = backend
                .refresh_if_expiring(Utc::now(), REFRESH_MARGIN_SECS)
                .await
            {
                log::warn!("token refresh failed: {e}");
            }
        });
    })
}
