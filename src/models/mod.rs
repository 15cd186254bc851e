//! Domain types shared by the sources, normalizer and aggregator.

pub mod diagnosis;
pub mod enums;
pub mod filters;
pub mod history;
pub mod patient;
pub mod profile;
pub mod rows;
pub mod treatment;

pub use diagnosis::*;
pub use enums::*;
pub use filters::*;
pub use history::*;
pub use patient::*;
pub use profile::*;
pub use rows::*;
pub use treatment::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
