//! Shared CLI argument types

mod common;
mod global;

pub use common::{OutputFormat, parse_param};
pub use global::GlobalOptions;
