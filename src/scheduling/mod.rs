//! Pure scheduling core: interval algebra, weekly-schedule normalization and
//! free-slot generation. Nothing here touches storage, which keeps the
//! booking rules testable in isolation.

pub mod interval;
pub mod schedule;
pub mod slots;
