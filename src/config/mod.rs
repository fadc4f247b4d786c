// src/config/mod.rs

//! Build description loading.
//!
//! - [`model`] maps `muddle.toml` onto serde types.
//! - [`validate`] turns the raw description into a checked one.
//! - [`loader`] reads files and discovers the tree root.
//! - [`register`] turns a description into rules and run-time policy.

pub mod loader;
pub mod model;
pub mod register;
pub mod validate;

pub use loader::{discover_root, load_and_validate, parse_description};
pub use model::BuildDescription;
pub use register::Registered;
