use crate::auth::use_app;
use crate::components::layout::AppShell;
use crate::hooks::use_fetch_guard;
use crate::web::dialog::alert_error;
use chrono::Utc;
use clubhub::views::dashboard::{DashboardStats, load_stats};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let ctx = use_app();
    let fetch = use_fetch_guard();

    let (stats, set_stats) = signal(DashboardStats::default());
    let (loading, set_loading) = signal(true);

    let load = move || {
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let scope = ctx.scope();
        set_loading.set(true);
        spawn_local(async move {
            let Some(result) = fetch.run(load_stats(backend.as_ref(), scope, Utc::now())).await
            else {
                return;
            };
            match result {
                Ok(data) => set_stats.set(data),
                Err(e) => alert_error(&e),
            }
            set_loading.set(false);
        });
    };

    // 初始加载
    load();

    let stat = move |title: &'static str, value: fn(&DashboardStats) -> usize, tone: &'static str| {
        view! {
            <div class="stat">
                <div class="stat-title">{title}</div>
                <div class=format!("stat-value {tone}")>
                    {move || if loading.get() {
                        view! { <span class="loading loading-dots loading-md"></span> }.into_any()
                    } else {
                        stats.with(value).into_any()
                    }}
                </div>
            </div>
        }
    };

    view! {
        <AppShell title="Dashboard">
            <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                {stat("Total members", |s| s.total_members, "text-primary")}
                {stat("Upcoming events", |s| s.upcoming_events, "text-success")}
                {stat("Departments", |s| s.departments, "text-secondary")}
                {stat("Total events", |s| s.total_events, "text-accent")}
            </div>
            <div class="flex justify-end">
                <button on:click=move |_| load() disabled=move || loading.get() class="btn btn-ghost btn-sm">
                    "Refresh"
                </button>
            </div>
        </AppShell>
    }
}
