//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence collaborator used by chart services.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs never interpret stored payloads.

pub mod kv_repo;
