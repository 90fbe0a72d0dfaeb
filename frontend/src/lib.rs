//! ClubHub 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `clubhub::route`: 路由定义与守卫（领域模型，位于核心 crate）
//! - `web::router`: 路由服务（核心引擎）
//! - `auth`: 后端门面与会话状态
//! - `components`: UI 组件层

mod auth;
mod hooks;
mod components {
    pub mod dashboard;
    pub mod events;
    pub mod layout;
    pub mod login;
    pub mod members;
    pub mod register;
    pub mod status;
}

use crate::auth::AppContext;
use crate::components::dashboard::DashboardPage;
use crate::components::events::EventsPage;
use crate::components::login::LoginPage;
use crate::components::members::MembersPage;
use crate::components::register::RegisterPage;
use crate::components::status::{ConfigErrorPage, LoadingScreen, NotFoundPage};

use leptos::prelude::*;

// 浏览器平台适配层
pub(crate) mod web {
    pub mod dialog;
    mod http;
    pub mod router;
    mod storage;
    mod timer;

    pub use http::FetchHttpClient;
    pub use storage::BrowserStorage;
    pub use timer::start_token_refresh;
}

use clubhub::AppRoute;
use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。根路由总会被守卫重定向，不会到达这里。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Register => view! { <RegisterPage /> }.into_any(),
        AppRoute::Root | AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::Members => view! { <MembersPage /> }.into_any(),
        AppRoute::Events => view! { <EventsPage /> }.into_any(),
        AppRoute::NotFound => view! { <NotFoundPage /> }.into_any(),
    }
}

fn placeholder() -> AnyView {
    view! { <LoadingScreen /> }.into_any()
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建应用上下文（门面 + 会话存储）
    let ctx = AppContext::new();
    provide_context(ctx);

    // 2. 缺少配置时只显示提示页，不发出任何请求
    if let Some(reason) = ctx.configuration_error() {
        return view! { <ConfigErrorPage reason=reason /> }.into_any();
    }

    // 3. 定时续期访问令牌
    let _refresh = StoredValue::new_local(web::start_token_refresh(ctx.backend()));

    view! {
        // 4. 路由器组件：注入会话状态实现守卫
        <Router status=ctx.status>
            <RouterOutlet matcher=route_matcher placeholder=placeholder />
        </Router>
    }
    .into_any()
}
