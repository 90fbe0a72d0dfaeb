//! 表单状态管理模块
//!
//! 将零散的 signal 整合为 `MemberFormState`，负责数据的持有、重置和到草稿的转换。

use clubhub::views::members::MemberDraft;
use leptos::prelude::*;

/// 使用 `RwSignal` 因为它实现了 `Copy` trait，可以直接放进闭包。
#[derive(Clone, Copy)]
pub struct MemberFormState {
    pub name: RwSignal<String>,
    pub email: RwSignal<String>,
    pub department: RwSignal<String>,
    pub joining_date: RwSignal<String>,
}

impl MemberFormState {
    pub fn new() -> Self {
        Self {
            name: RwSignal::new(String::new()),
            email: RwSignal::new(String::new()),
            department: RwSignal::new(String::new()),
            joining_date: RwSignal::new(String::new()),
        }
    }

    pub fn reset(&self) {
        self.name.set(String::new());
        self.email.set(String::new());
        self.department.set(String::new());
        self.joining_date.set(String::new());
    }

    pub fn to_draft(&self) -> MemberDraft {
        MemberDraft {
            name: self.name.get_untracked(),
            email: self.email.get_untracked(),
            department: self.department.get_untracked(),
            joining_date: self.joining_date.get_untracked(),
        }
    }
}

impl Default for MemberFormState {
    fn default() -> Self {
        Self::new()
    }
}
