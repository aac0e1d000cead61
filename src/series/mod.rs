//! Windowing primitives over plain daily value sequences.
//!
//! Every transform here takes `&[Value]` and returns a fresh `Vec<Value>`; none of
//! them knows about dates, tables or indicators. Length changes happen only in
//! [`align`], which pads with an explicit fill value.

pub mod align;
pub mod diff;
pub mod gaps;
pub mod rolling;
pub mod value;

pub use align::*;
pub use diff::*;
pub use gaps::*;
pub use rolling::*;
pub use value::*;
