//! 页面骨架：导航栏 + 内容区

use crate::auth::{sign_out, use_app};
use crate::web::router::{Link, use_router};
use clubhub::AppRoute;
use leptos::prelude::*;

const NAV_ITEMS: [AppRoute; 3] = [AppRoute::Dashboard, AppRoute::Members, AppRoute::Events];

#[component]
pub fn Navbar() -> impl IntoView {
    let ctx = use_app();
    let router = use_router();

    let label = move || {
        ctx.status
            .with(|s| s.session().map(|s| s.identity.label().to_string()))
            .unwrap_or_default()
    };

    view! {
        <div class="navbar bg-base-100 rounded-box shadow-xl">
            <div class="flex-1 gap-2">
                <span class="btn btn-ghost text-xl">"ClubHub"</span>
                <ul class="menu menu-horizontal px-1 gap-1">
                    {NAV_ITEMS
                        .into_iter()
                        .map(|route| {
                            let class = move || {
                                if router.requested().get() == route { "active" } else { "" }
                            };
                            view! {
                                <li class=class>
                                    <Link to=route>{route.title()}</Link>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            </div>
            <div class="flex-none gap-2">
                <span class="badge badge-neutral hidden md:inline-flex">{label}</span>
                <button on:click=move |_| sign_out(ctx) class="btn btn-outline btn-error btn-sm">
                    "Sign out"
                </button>
            </div>
        </div>
    }
}

/// 受保护页面的统一骨架
#[component]
pub fn AppShell(
    /// 页面标题
    title: &'static str,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                <Navbar />
                <h2 class="text-2xl font-bold">{title}</h2>
                {children()}
            </div>
        </div>
    }
}
