//! Shared types and helpers for Fleet's scheduler and controller crates:
//! the declarative object model (§3, §6), the condition-chain algebra
//! (§4.B), the Snapshot Store contract (§4.A, §5), label/annotation
//! validation (GLOSSARY, kvp), and the ambient logging and error-handling
//! stack every other crate in this workspace builds on.
//!
//! ## Crate Features
//!
//! This crate currently has no optional features; everything below is part
//! of the default build.

pub mod condition;
pub mod error;
pub mod iter;
pub mod kvp;
pub mod logging;
pub mod model;
pub mod store;
pub mod time;
pub mod validation;
