//! 浏览器原生对话框

use clubhub::ClubError;

/// 阻塞式提示，显示服务端原始消息
pub fn alert_error(error: &ClubError) {
    log::error!("{error}");
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(error.message());
    }
}

/// 删除前确认；无法弹窗时视为取消
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}
