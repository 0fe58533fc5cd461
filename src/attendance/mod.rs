//! Attendance domain logic: day session reconstruction from raw punch
//! logs, day classification, regular/overtime split, day credits, and the
//! salary figures derived from them. Everything here is pure and
//! deterministic given the inputs and "now"; persistence and the
//! recognition service live elsewhere.

mod gate;
mod policy;
mod session;
mod summary;

pub use gate::{in_cooldown, similarity_ok};
pub use policy::{DayStatus, IncompleteDayPolicy, LogType, PayrollRules};
pub use session::{DaySession, Punch, reconstruct_sessions};
pub use summary::{AttendanceSummary, DayRecord, summarize};
