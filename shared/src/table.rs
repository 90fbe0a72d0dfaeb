//! 表定义模块
//!
//! 每张远端表对应一个行类型，行类型通过 [`Table`] 声明表名、默认查询列和插入载荷类型。
//! Facade 依赖这些静态声明在边界处解析响应，而不是在视图中做运行时形状检查。

use crate::{
    AttendanceRecord, Event, Member, NewAttendance, NewEvent, NewMember, TABLE_ATTENDANCE,
    TABLE_EVENTS, TABLE_MEMBERS,
};
use serde::{Serialize, de::DeserializeOwned};

/// A remote table and the row type it yields.
pub trait Table: DeserializeOwned + 'static {
    /// The payload accepted by `insert`.
    type Insert: Serialize + 'static;
    /// The table name on the data API.
    const NAME: &'static str;
    /// Column list requested when the caller does not override it.
    const DEFAULT_SELECT: &'static str = "*";
}

impl Table for Member {
    type Insert = NewMember;
    const NAME: &'static str = TABLE_MEMBERS;
}

impl Table for Event {
    type Insert = NewEvent;
    const NAME: &'static str = TABLE_EVENTS;
    const DEFAULT_SELECT: &'static str = "*,attendance(*)";
}

impl Table for AttendanceRecord {
    type Insert = NewAttendance;
    const NAME: &'static str = TABLE_ATTENDANCE;
}
