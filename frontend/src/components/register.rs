use crate::auth::{sign_up, use_app};
use crate::web::router::Link;
use clubhub::AppRoute;
use clubhub::backend::{Registration, SignUpOutcome};
use leptos::prelude::*;
use leptos::task::spawn_local;

const MIN_PASSWORD_LEN: usize = 6;

#[component]
pub fn RegisterPage() -> impl IntoView {
    let ctx = use_app();

    let full_name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (confirmation_sent, set_confirmation_sent) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let registration = Registration {
            email: email.get().trim().to_string(),
            password: password.get(),
            full_name: full_name.get().trim().to_string(),
        };
        if registration.email.is_empty() || registration.full_name.is_empty() {
            set_error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            set_error_msg.set(Some(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        spawn_local(async move {
            match sign_up(ctx, registration).await {
                // 路由守卫会把已登录用户带到面板
                Ok(SignUpOutcome::SignedIn(_)) => {}
                Ok(SignUpOutcome::ConfirmationRequired) => set_confirmation_sent.set(true),
                Err(e) => set_error_msg.set(Some(e.message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    let field = move |id: &'static str, label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <div class="form-control">
                <label class="label" for=id>
                    <span class="label-text">{label}</span>
                </label>
                <input
                    id=id
                    type=kind
                    on:input=move |ev| value.set(event_target_value(&ev))
                    prop:value=value
                    class="input input-bordered"
                    required
                />
            </div>
        }
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Create account"</h1>
                    <p class="text-base-content/70">"Join ClubHub to manage members and events"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <Show
                        when=move || !confirmation_sent.get()
                        fallback=|| view! {
                            <div class="card-body text-center space-y-4">
                                <p>"Check your inbox to confirm your email address, then sign in."</p>
                                <Link to=AppRoute::Login class="btn btn-primary">"Go to sign in"</Link>
                            </div>
                        }
                    >
                        <form class="card-body" on:submit=on_submit>
                            <Show when=move || error_msg.get().is_some()>
                                <div role="alert" class="alert alert-error text-sm py-2">
                                    <span>{move || error_msg.get().unwrap_or_default()}</span>
                                </div>
                            </Show>

                            {field("full_name", "Full name", "text", full_name)}
                            {field("email", "Email", "email", email)}
                            {field("password", "Password", "password", password)}

                            <div class="form-control mt-6">
                                <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                    {move || if is_submitting.get() { "Creating account..." } else { "Create account" }}
                                </button>
                            </div>
                            <p class="text-sm text-center mt-2">
                                "Already registered? "
                                <Link to=AppRoute::Login class="link link-primary">"Sign in"</Link>
                            </p>
                        </form>
                    </Show>
                </div>
            </div>
        </div>
    }
}
