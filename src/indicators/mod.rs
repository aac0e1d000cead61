//! Indicator formulas over aligned daily series.
//!
//! Each calculator owns its parameter struct. `warmup()` on a parameter struct is
//! the number of leading days that are always missing in the output: the formula
//! needs that much history before it means anything, and consumers must not read
//! those days as zero.
//!
//! Delays, periods and ignore windows changed several times over the life of
//! the dashboard; they are parameters here, with the latest values as defaults.

pub mod cfr;
pub mod incidence;
pub mod positivity;
pub mod prevalence;
pub mod rt;

pub use cfr::*;
pub use incidence::*;
pub use positivity::*;
pub use prevalence::*;
pub use rt::*;

/// Smoothing window shared by every displayed indicator.
pub const SMOOTHING_WINDOW: usize = 7;
