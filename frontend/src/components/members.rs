mod form_state;

use self::form_state::MemberFormState;
use crate::auth::use_app;
use crate::components::layout::AppShell;
use crate::hooks::use_fetch_guard;
use crate::web::dialog::{alert_error, confirm};
use clubhub::ClubErrorKind;
use clubhub::views::members::{add_member, delete_member, fetch_members, filter_members};
use clubhub_shared::Member;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn MembersPage() -> impl IntoView {
    let ctx = use_app();
    let fetch = use_fetch_guard();

    let members = RwSignal::new(Vec::<Member>::new());
    let (loading, set_loading) = signal(true);
    let (submitting, set_submitting) = signal(false);
    let (form_error, set_form_error) = signal(Option::<String>::None);
    let search = RwSignal::new(String::new());
    let form = MemberFormState::new();

    let load = move || {
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let scope = ctx.scope();
        set_loading.set(true);
        spawn_local(async move {
            match fetch.run(fetch_members(backend.as_ref(), scope)).await {
                Some(Ok(list)) => members.set(list),
                Some(Err(e)) => alert_error(&e),
                // 被后续请求取代，加载状态由后者结束
                None => return,
            }
            set_loading.set(false);
        });
    };

    // 写入后的重新加载结果
    let apply_reload = move |reloaded: Option<Vec<Member>>| {
        if let Some(list) = reloaded {
            members.set(list);
            set_loading.set(false);
        }
    };

    // 初始加载
    load();

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(owner) = ctx.user_id() else {
            return;
        };
        let new_member = match form.to_draft().validate(owner) {
            Ok(member) => member,
            Err(e) => {
                set_form_error.set(Some(e.message().to_string()));
                return;
            }
        };

        set_form_error.set(None);
        set_submitting.set(true);
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let scope = ctx.scope();
        spawn_local(async move {
            match add_member(backend.as_ref(), scope, &new_member, &fetch).await {
                Ok(reloaded) => {
                    apply_reload(reloaded);
                    form.reset();
                }
                Err(e) if fetch.is_cancelled() => log::warn!("add member failed after leaving the page: {e}"),
                Err(e) if e.kind == ClubErrorKind::InvalidInput => {
                    set_form_error.set(Some(e.message().to_string()))
                }
                Err(e) => alert_error(&e),
            }
            set_submitting.set(false);
        });
    };

    let on_delete = move |member: Member| {
        if !confirm(&format!("Delete {}? This cannot be undone.", member.name)) {
            return;
        }
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let scope = ctx.scope();
        spawn_local(async move {
            match delete_member(backend.as_ref(), scope, member.id, &fetch).await {
                Ok(reloaded) => apply_reload(reloaded),
                Err(e) if fetch.is_cancelled() => log::warn!("delete member failed after leaving the page: {e}"),
                Err(e) => alert_error(&e),
            }
        });
    };

    // 过滤结果只在内存中派生，每次输入都重新计算
    let visible = move || {
        let needle = search.get();
        members.with(|list| filter_members(list, &needle).into_iter().cloned().collect::<Vec<_>>())
    };

    let input = move |label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <label class="form-control">
                <span class="label-text mb-1">{label}</span>
                <input
                    type=kind
                    on:input=move |ev| value.set(event_target_value(&ev))
                    prop:value=value
                    class="input input-bordered input-sm"
                />
            </label>
        }
    };

    view! {
        <AppShell title="Members">
            <div class="card bg-base-100 shadow-xl">
                <form class="card-body" on:submit=on_submit>
                    <h3 class="card-title">"Add member"</h3>
                    <Show when=move || form_error.get().is_some()>
                        <div role="alert" class="alert alert-warning text-sm py-2">
                            <span>{move || form_error.get().unwrap_or_default()}</span>
                        </div>
                    </Show>
                    <div class="grid grid-cols-1 md:grid-cols-4 gap-4">
                        {input("Name", "text", form.name)}
                        {input("Email", "email", form.email)}
                        {input("Department", "text", form.department)}
                        {input("Joining date", "date", form.joining_date)}
                    </div>
                    <div class="card-actions justify-end">
                        <button class="btn btn-primary btn-sm" disabled=move || submitting.get()>
                            "Add member"
                        </button>
                    </div>
                </form>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body p-0">
                    <div class="flex flex-col md:flex-row md:items-center justify-between gap-4 p-6 pb-2">
                        <h3 class="card-title">
                            "Roster " <span class="badge badge-neutral">{move || members.with(Vec::len)}</span>
                        </h3>
                        <input
                            type="search"
                            placeholder="Filter by name, email or department"
                            on:input=move |ev| search.set(event_target_value(&ev))
                            prop:value=search
                            class="input input-bordered input-sm w-full md:w-80"
                        />
                    </div>

                    <div class="overflow-x-auto w-full">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Name"</th>
                                    <th>"Email"</th>
                                    <th>"Department"</th>
                                    <th class="hidden md:table-cell">"Joined"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || loading.get() && members.with(Vec::is_empty)>
                                    <tr>
                                        <td colspan="5" class="text-center py-8 text-base-content/50">
                                            <span class="loading loading-spinner loading-md"></span> " Loading..."
                                        </td>
                                    </tr>
                                </Show>
                                <Show when=move || !loading.get() && visible().is_empty()>
                                    <tr>
                                        <td colspan="5" class="text-center py-8 text-base-content/50">
                                            "No members match."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=visible
                                    key=|m: &Member| m.id
                                    children=move |member: Member| {
                                        let joined = member.joining_date.format("%Y-%m-%d").to_string();
                                        let target = member.clone();
                                        view! {
                                            <tr>
                                                <td class="font-bold">{member.name}</td>
                                                <td class="font-mono text-sm opacity-70">{member.email}</td>
                                                <td><div class="badge badge-accent badge-outline">{member.department}</div></td>
                                                <td class="hidden md:table-cell">{joined}</td>
                                                <td>
                                                    <button
                                                        on:click=move |_| on_delete(target.clone())
                                                        class="btn btn-ghost btn-sm text-error"
                                                    >
                                                        "Delete"
                                                    </button>
                                                </td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>
        </AppShell>
    }
}
