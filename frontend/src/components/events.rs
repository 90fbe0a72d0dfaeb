mod form_state;

use self::form_state::EventFormState;
use crate::auth::use_app;
use crate::components::layout::AppShell;
use crate::hooks::use_fetch_guard;
use crate::web::dialog::{alert_error, confirm};
use chrono::{Local, Utc};
use clubhub::views::events::{
    create_event, delete_event, fetch_events, mark_attendance, partition_events, pick_member,
};
use clubhub::views::members::fetch_members;
use clubhub_shared::{Event, Member};
use leptos::prelude::*;
use leptos::task::spawn_local;
use uuid::Uuid;

/// 参会者姓名；成员已被删除时显示占位
fn attendee_names(event: &Event, members: &[Member]) -> Vec<String> {
    event
        .attendance
        .iter()
        .map(|mark| {
            members
                .iter()
                .find(|m| m.id == mark.member_id)
                .map(|m| m.name.clone())
                .unwrap_or_else(|| "Unknown member".to_string())
        })
        .collect()
}

#[component]
pub fn EventsPage() -> impl IntoView {
    let ctx = use_app();
    let fetch = use_fetch_guard();
    // 成员列表只随页面加载刷新，不与活动的增删共用序号
    let member_fetch = use_fetch_guard();

    let events = RwSignal::new(Vec::<Event>::new());
    let members = RwSignal::new(Vec::<Member>::new());
    let (loading, set_loading) = signal(true);
    let (submitting, set_submitting) = signal(false);
    let (form_error, set_form_error) = signal(Option::<String>::None);
    let form = EventFormState::new();

    let load = move || {
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let member_fetch = member_fetch.get_value();
        let scope = ctx.scope();
        set_loading.set(true);
        spawn_local(async move {
            let backend = backend.as_ref();
            let (event_result, member_result) = futures::join!(
                fetch.run(fetch_events(backend, scope)),
                member_fetch.run(fetch_members(backend, scope))
            );
            if fetch.is_cancelled() {
                return;
            }

            // 活动列表被取代时，加载状态由后续请求结束
            let superseded = event_result.is_none();

            // 两个请求都失败时只提示一次
            let mut failure = None;
            match member_result {
                Some(Ok(list)) => members.set(list),
                Some(Err(e)) => failure = Some(e),
                None => {}
            }
            match event_result {
                Some(Ok(list)) => events.set(list),
                Some(Err(e)) => failure = failure.or(Some(e)),
                None => {}
            }
            if let Some(e) = failure {
                alert_error(&e);
            }
            if !superseded {
                set_loading.set(false);
            }
        });
    };

    // 写入后的重新加载结果
    let apply_reload = move |reloaded: Option<Vec<Event>>| {
        if let Some(list) = reloaded {
            events.set(list);
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
        let new_event = match form.to_draft().validate(owner, &Local) {
            Ok(event) => event,
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
            match create_event(backend.as_ref(), scope, &new_event, &fetch).await {
                Ok(reloaded) => {
                    apply_reload(reloaded);
                    form.reset();
                }
                Err(e) if fetch.is_cancelled() => log::warn!("create event failed after leaving the page: {e}"),
                Err(e) => alert_error(&e),
            }
            set_submitting.set(false);
        });
    };

    let on_mark = move |event: Event, selected: Option<Uuid>| {
        let member_id = match members.with_untracked(|list| pick_member(list, selected)) {
            Ok(id) => id,
            Err(e) => {
                alert_error(&e);
                return;
            }
        };
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let scope = ctx.scope();
        spawn_local(async move {
            match mark_attendance(backend.as_ref(), scope, &event, member_id, &fetch).await {
                Ok(reloaded) => apply_reload(reloaded),
                Err(e) if fetch.is_cancelled() => log::warn!("mark attendance failed after leaving the page: {e}"),
                Err(e) => alert_error(&e),
            }
        });
    };

    let on_delete = move |event: Event| {
        if !confirm(&format!("Delete \"{}\" and its attendance?", event.title)) {
            return;
        }
        let backend = ctx.backend();
        let fetch = fetch.get_value();
        let scope = ctx.scope();
        spawn_local(async move {
            match delete_event(backend.as_ref(), scope, event.id, &fetch).await {
                Ok(reloaded) => apply_reload(reloaded),
                Err(e) if fetch.is_cancelled() => log::warn!("delete event failed after leaving the page: {e}"),
                Err(e) => alert_error(&e),
            }
        });
    };

    let event_card = move |event: Event| {
        let selected = RwSignal::new(Option::<Uuid>::None);
        let when = event.date.with_timezone(&Local).format("%a %d %b %Y, %H:%M").to_string();
        let attendance_count = event.attendance.len();
        let names = {
            let event = event.clone();
            move || members.with(|list| attendee_names(&event, list).join(", "))
        };
        let mark_target = event.clone();
        let delete_target = event.clone();

        view! {
            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <div class="flex items-start justify-between gap-2">
                        <div>
                            <h4 class="card-title">{event.title}</h4>
                            <p class="text-sm opacity-70">{when} " · " {event.venue}</p>
                        </div>
                        <div class="badge badge-primary">{attendance_count} " attending"</div>
                    </div>
                    <p>{event.description}</p>
                    <p class="text-xs opacity-60">{names}</p>
                    <div class="card-actions justify-end items-center">
                        <select
                            class="select select-bordered select-sm"
                            on:change=move |ev| selected.set(Uuid::parse_str(&event_target_value(&ev)).ok())
                        >
                            <option value="" selected>"Choose member"</option>
                            {move || {
                                members
                                    .get()
                                    .into_iter()
                                    .map(|m| view! { <option value=m.id.to_string()>{m.name}</option> })
                                    .collect_view()
                            }}
                        </select>
                        <button
                            class="btn btn-primary btn-sm"
                            on:click=move |_| on_mark(mark_target.clone(), selected.get_untracked())
                        >
                            "Mark attendance"
                        </button>
                        <button
                            class="btn btn-ghost btn-sm text-error"
                            on:click=move |_| on_delete(delete_target.clone())
                        >
                            "Delete"
                        </button>
                    </div>
                </div>
            </div>
        }
    };

    // 每次渲染按当前时间重新划分
    let partitioned = move || {
        let now = Utc::now();
        events.with(|list| {
            let (upcoming, past) = partition_events(list, now);
            (
                upcoming.into_iter().cloned().collect::<Vec<_>>(),
                past.into_iter().cloned().collect::<Vec<_>>(),
            )
        })
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
        <AppShell title="Events">
            <div class="card bg-base-100 shadow-xl">
                <form class="card-body" on:submit=on_submit>
                    <h3 class="card-title">"Create event"</h3>
                    <Show when=move || form_error.get().is_some()>
                        <div role="alert" class="alert alert-warning text-sm py-2">
                            <span>{move || form_error.get().unwrap_or_default()}</span>
                        </div>
                    </Show>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                        {input("Title", "text", form.title)}
                        {input("Date", "datetime-local", form.date)}
                        {input("Venue", "text", form.venue)}
                    </div>
                    <label class="form-control">
                        <span class="label-text mb-1">"Description"</span>
                        <textarea
                            on:input=move |ev| form.description.set(event_target_value(&ev))
                            prop:value=form.description
                            class="textarea textarea-bordered"
                        ></textarea>
                    </label>
                    <div class="card-actions justify-end">
                        <button class="btn btn-primary btn-sm" disabled=move || submitting.get()>
                            "Create event"
                        </button>
                    </div>
                </form>
            </div>

            <Show when=move || loading.get() && events.with(Vec::is_empty)>
                <div class="text-center py-8">
                    <span class="loading loading-spinner loading-md"></span>
                </div>
            </Show>

            <section class="space-y-4">
                <h3 class="text-xl font-semibold">"Upcoming"</h3>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                    <For each=move || partitioned().0 key=|e: &Event| (e.id, e.attendance.len()) children=event_card />
                </div>
            </section>

            <section class="space-y-4">
                <h3 class="text-xl font-semibold">"Past"</h3>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-4 opacity-80">
                    <For each=move || partitioned().1 key=|e: &Event| (e.id, e.attendance.len()) children=event_card />
                </div>
            </section>
        </AppShell>
    }
}
