// src/engine/mod.rs

//! Build engine.
//!
//! This module ties together:
//! - the build description and the rules registered from it
//! - the tag store recording what has been asserted
//! - graph expansion and the scheduler
//! - DWIM target selection
//!
//! Building and bookkeeping live in [`core`]; read-only questions about the
//! tree are answered in [`query`].

pub mod core;
pub mod query;

pub use core::Engine;
pub use query::LabelStatus;
