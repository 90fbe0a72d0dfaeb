//! 占位与状态页面

use crate::web::router::Link;
use clubhub::AppRoute;
use clubhub::config::{ENV_ANON_KEY, ENV_SERVICE_URL};
use leptos::prelude::*;

#[component]
pub fn LoadingScreen() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <span class="loading loading-spinner loading-lg text-primary"></span>
        </div>
    }
}

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="text-center space-y-4">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl">"Page not found"</p>
                <Link to=AppRoute::Dashboard class="btn btn-primary">"Back to dashboard"</Link>
            </div>
        </div>
    }
}

/// 缺少后端配置时的整页提示
#[component]
pub fn ConfigErrorPage(reason: String) -> impl IntoView {
    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content w-full max-w-xl">
                <div class="card w-full shadow-2xl bg-base-100">
                    <div class="card-body space-y-2">
                        <h1 class="card-title text-2xl text-error">"Backend not configured"</h1>
                        <p>{reason}</p>
                        <p class="text-base-content/70 text-sm">
                            "Rebuild the app with both variables set, for example:"
                        </p>
                        <pre class="bg-base-200 rounded-box p-4 text-xs overflow-x-auto">
                            {format!(
                                "{ENV_SERVICE_URL}=https://<project>.supabase.co \\\n{ENV_ANON_KEY}=<anon key> \\\ntrunk build --release"
                            )}
                        </pre>
                    </div>
                </div>
            </div>
        </div>
    }
}
