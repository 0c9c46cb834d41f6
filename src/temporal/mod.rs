//! Calendar time for parameter value series.
//!
//! Everything temporal in the pipeline reduces to two concepts: an `Instant`
//! (a day-granularity calendar date, totally ordered) and a `Cadence` (the
//! unit by which an instant is stepped forward during interpolation).

pub use self::instant::{Cadence, Instant, ParseInstantError};

mod instant;
