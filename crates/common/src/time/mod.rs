//! Time abstractions
//!
//! Business rules that depend on "today" (streaks, daily counters) read the
//! current instant through [`Clock`] so they can be exercised deterministically.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
