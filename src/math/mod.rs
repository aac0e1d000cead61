//! Mathematical utilities: least squares and linear correlation.

pub mod correlation;
pub mod ols;

pub use correlation::*;
pub use ols::*;
