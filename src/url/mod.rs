//! URL handling module for Site-Digest
//!
//! This module provides URL normalization and same-origin checks.

mod domain;
mod normalize;

pub use domain::{origin_of, same_origin};
pub use normalize::normalize_url;
