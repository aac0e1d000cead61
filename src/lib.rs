//! `coviz` library crate.
//!
//! Turns a snapshot of public epidemic tables (daily report, tests, all-cause
//! mortality, vaccination) into aligned indicator series, age-stratified tables
//! and an excess-mortality baseline. The binary (`coviz`) is a thin wrapper so
//! that the pipeline stays testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod io;
pub mod logging;
pub mod math;
pub mod mortality;
pub mod report;
pub mod series;
pub mod stratify;
