//! All-cause mortality: the historical baseline and excess deaths over it.

pub mod baseline;
pub mod excess;

pub use baseline::{BaselineParams, MortalityBaseline, ReferenceYears, baseline, baseline_for_axis};
pub use excess::*;
