//! 活动表单状态

use clubhub::views::events::EventDraft;
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub struct EventFormState {
    pub title: RwSignal<String>,
    /// `datetime-local` 输入框的原始值
    pub date: RwSignal<String>,
    pub description: RwSignal<String>,
    pub venue: RwSignal<String>,
}

impl EventFormState {
    pub fn new() -> Self {
        Self {
            title: RwSignal::new(String::new()),
            date: RwSignal::new(String::new()),
            description: RwSignal::new(String::new()),
            venue: RwSignal::new(String::new()),
        }
    }

    pub fn reset(&self) {
        self.title.set(String::new());
        self.date.set(String::new());
        self.description.set(String::new());
        self.venue.set(String::new());
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.get_untracked(),
            date: self.date.get_untracked(),
            description: self.description.get_untracked(),
            venue: self.venue.get_untracked(),
        }
    }
}

impl Default for EventFormState {
    fn default() -> Self {
        Self::new()
    }
}
