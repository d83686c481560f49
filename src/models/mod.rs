//! Production scheduling domain models.
//!
//! Plain value types built fresh for every planning or analysis call.
//!
//! | Type | Meaning |
//! |------|---------|
//! | `WorkOrder` | Unit of production work with skills, due instant, precedence |
//! | `Workstation` | Slot capacity, skills, efficiency, load, maintenance |
//! | `ScheduleAssignment` | Work order × workstation × [start, end) |
//! | `Schedule` | One assignment per work order, plus violations |

mod schedule;
mod time_window;
mod work_order;
mod workstation;

pub use schedule::{Schedule, ScheduleAssignment, Violation, ViolationType};
pub use time_window::{
    blocked_ms_in_range, earliest_clear_start, TimeWindow, DAY_MS, HOUR_MS,
    MAX_TIME_MS,
};
pub use work_order::{WorkOrder, MAX_COMPLEXITY};
pub use workstation::Workstation;
