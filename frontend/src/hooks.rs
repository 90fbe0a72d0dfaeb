//! 页面级工具

use clubhub::views::FetchGuard;
use leptos::prelude::*;

/// 页面的请求守卫；页面卸载时取消，之后到达的结果都会被丢弃
pub fn use_fetch_guard() -> StoredValue<FetchGuard, LocalStorage> {
    let guard = StoredValue::new_local(FetchGuard::new());
    on_cleanup(move || {
        guard.try_with_value(|g| g.cancel());
    });
    guard
}
