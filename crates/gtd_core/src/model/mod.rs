//! Task/comment domain model and lifecycle rules.
//!
//! # Responsibility
//! - Define canonical task and comment records mutated by history commands.
//! - Own the GTD status state machine as pure, store-free checks.
//!
//! # Invariants
//! - Every task and comment is identified by a caller-assigned opaque id.
//! - `waiting_for` is set iff `status == Waiting`.
//! - A project never has a parent; a parent is always a project.

pub mod comment;
pub mod lifecycle;
pub mod task;
pub mod validation;
