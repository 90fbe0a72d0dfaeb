//! 路由定义与守卫 (Routes & Guard)
//!
//! Pure logic with no DOM access. The frontend router asks [`guard`] what to
//! do on every navigation and on every session change.

use crate::session::SessionStatus;
use std::fmt::Display;

/// Application routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// `/`, always forwarded to the default view
    Root,
    Login,
    Register,
    /// Default view after sign-in
    #[default]
    Dashboard,
    Members,
    Events,
    NotFound,
}

impl AppRoute {
    /// Parse a URL path. A single trailing slash is ignored.
    pub fn from_path(path: &str) -> Self {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        match path {
            "" | "/" => Self::Root,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard,
            "/members" => Self::Members,
            "/events" => Self::Events,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Members => "/members",
            Self::Events => "/events",
            Self::NotFound => "/404",
        }
    }

    /// **核心守卫逻辑：该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard | Self::Members | Self::Events)
    }

    /// Pages a signed-in user is sent away from.
    pub fn is_auth_page(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Root | Self::Dashboard => "Dashboard",
            Self::Login => "Sign in",
            Self::Register => "Create account",
            Self::Members => "Members",
            Self::Events => "Events",
            Self::NotFound => "Not found",
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

/// What the router should do with a requested route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Session still resolving; show the placeholder.
    ShowLoading,
    Render(AppRoute),
    RedirectTo(AppRoute),
}

/// Decide how to handle `requested` under `status`.
///
/// Rules, first match wins: loading shows the placeholder; root goes to the
/// default view; anonymous users are sent from protected views to login;
/// signed-in users are sent from login/register to the default view.
pub fn guard(status: &SessionStatus, requested: AppRoute) -> RouteAction {
    if status.is_loading() {
        return RouteAction::ShowLoading;
    }
    if requested == AppRoute::Root {
        return RouteAction::RedirectTo(AppRoute::default());
    }

    let authenticated = status.is_authenticated();
    if requested.requires_auth() && !authenticated {
        return RouteAction::RedirectTo(AppRoute::Login);
    }
    if requested.is_auth_page() && authenticated {
        return RouteAction::RedirectTo(AppRoute::default());
    }
    RouteAction::Render(requested)
}
