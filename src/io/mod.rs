//! Input/output helpers.
//!
//! - table locations and fetching (`source`)
//! - CSV ingest of the snapshot tables (`ingest`)
//! - bundle exports: CSV (`export`) and JSON (`bundle`)

pub mod bundle;
pub mod export;
pub mod ingest;
pub mod source;

pub use bundle::*;
pub use export::*;
pub use ingest::*;
pub use source::*;
