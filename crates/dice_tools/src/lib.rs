//! # Dice Development Tools
//!
//! Command-line tools for catalog authors:
//! - Catalog validation
//! - Price curves for tiers and skill paths

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod curve;
pub mod validate;
