//! Building blocks shared by the linkwatch binaries.
//!
//! This crate provides:
//! - A reachability check that shells out to `ping` with a bounded timeout
//! - Formatting of elapsed durations for operator facing messages

mod duration;
mod probe;

pub use duration::*;
pub use probe::*;
