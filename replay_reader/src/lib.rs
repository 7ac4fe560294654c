//! Session replay reconstruction.
//!
//! [`replay::ReplayReader`] turns the independently fetched collections of a
//! recorded browser session into one immutable view with reconciled
//! timestamps. [`loader`] and [`store`] fetch those collections from disk,
//! [`app`] is the command-line front end.

pub mod app;
pub mod loader;
pub mod output;
pub mod replay;
pub mod store;

pub use replay::{ReplayReader, ReplayReaderParams};
