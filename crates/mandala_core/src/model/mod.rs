//! Domain model for the recursive 3x3 grid.
//!
//! # Responsibility
//! - Define cells, the flat chart store and the visible grid projection.
//!
//! # Invariants
//! - Cells live in one flat map keyed by position-derived id.
//! - Parent links are id lookups, never owning references.

pub mod cell;
pub mod chart;
pub mod grid;
