//! Macro legalization: removes overlaps between equally sized macros while keeping them close to
//! where an upstream placer put them.

#[cfg(test)]
#[macro_use]
mod test_util;

pub mod config;
pub mod driver;
pub mod error;
pub mod history;
pub mod legalizer;
pub mod overlap;
pub mod stats;

pub use config::Config;
pub use error::LegalizeError;
