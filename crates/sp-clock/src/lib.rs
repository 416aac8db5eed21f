//! Wall-clock-aligned slot and period driver (§4.6). Pure functions of
//! `now` plus a thin async runner layered on top; no locks, no shared
//! mutable state beyond the immutable configuration each is built from.

pub mod period;
pub mod slot;

pub use period::{PeriodClock, PeriodRunner};
pub use slot::SlotClock;
