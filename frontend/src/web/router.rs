//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API：所有对 window.history 的操作都集中在此模块。
//! 每次导航与每次会话变化都交给 [`clubhub::guard`] 决定渲染还是重定向。

use clubhub::{AppRoute, RouteAction, SessionStatus, guard};
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态
fn push_history_state(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

/// 替换 History 状态（用于重定向）
fn replace_history_state(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

/// 路由器服务
///
/// 保存用户请求的路由；实际显示的内容由守卫根据会话状态推导。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 用户请求的路由
    requested: ReadSignal<AppRoute>,
    set_requested: WriteSignal<AppRoute>,
    /// 会话状态（注入的信号，实现解耦）
    status: ReadSignal<SessionStatus>,
}

impl RouterService {
    fn new(status: ReadSignal<SessionStatus>) -> Self {
        let (requested, set_requested) = signal(AppRoute::from_path(&current_path()));
        Self {
            requested,
            set_requested,
            status,
        }
    }

    /// 当前应执行的动作
    pub fn action(&self) -> RouteAction {
        self.status.with(|status| guard(status, self.requested.get()))
    }

    pub fn requested(&self) -> ReadSignal<AppRoute> {
        self.requested
    }

    /// 导航到指定路由（pushState）
    pub fn navigate(&self, route: AppRoute) {
        if self.requested.get_untracked() == route {
            return;
        }
        push_history_state(route.to_path());
        self.set_requested.set(route);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_requested = self.set_requested;

        let closure = Closure::<dyn Fn()>::new(move || {
            set_requested.set(AppRoute::from_path(&current_path()));
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 守卫要求重定向时改写地址栏
    ///
    /// 请求路由或会话状态任一变化都会重新求值。
    fn setup_guard_redirect(&self) {
        let requested = self.requested;
        let set_requested = self.set_requested;
        let status = self.status;

        Effect::new(move |_| {
            let route = requested.get();
            let action = status.with(|s| guard(s, route));
            if let RouteAction::RedirectTo(target) = action {
                log::info!("[Router] {route} -> {target}");
                replace_history_state(target.to_path());
                set_requested.set(target);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(status: ReadSignal<SessionStatus>) -> RouterService {
    let router = RouterService::new(status);

    router.init_popstate_listener();
    router.setup_guard_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    /// 会话状态信号
    status: ReadSignal<SessionStatus>,
    children: Children,
) -> impl IntoView {
    provide_router(status);
    children()
}

/// 路由出口组件
///
/// 加载中与等待重定向时显示占位视图。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
    /// 占位视图
    placeholder: fn() -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || match router.action() {
        RouteAction::Render(route) => matcher(route),
        RouteAction::ShowLoading | RouteAction::RedirectTo(_) => placeholder(),
    }
}

/// 站内链接：拦截点击，改用路由服务导航
#[component]
pub fn Link(
    to: AppRoute,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.navigate(to);
    };

    view! {
        <a href=to.to_path() class=class on:click=on_click>
            {children()}
        </a>
    }
}
