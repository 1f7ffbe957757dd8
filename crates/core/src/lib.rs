//! Core business logic for signalhub.

pub mod services;

pub use services::*;
