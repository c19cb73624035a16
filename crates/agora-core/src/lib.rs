//! # Agora Core
//!
//! The domain layer of the Agora backend.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod validation;

pub use error::DomainError;
pub use service::{PostDraft, PostService};
