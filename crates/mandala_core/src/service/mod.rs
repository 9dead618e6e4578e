//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate chart state and repository calls into use-case level APIs.
//! - Keep CLI/UI layers decoupled from storage details.

pub mod chart_service;
