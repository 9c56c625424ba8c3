//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads into view-level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod task_service;
