//! Read-only 3x3 projection of the active grid.
//!
//! # Responsibility
//! - Hand renderers a row-major snapshot of the visible grid.
//!
//! # Invariants
//! - Slot (1,1) holds the active center.
//! - A view is a copy; mutating it never touches chart state.

use crate::model::cell::{Cell, CellId, GridPos, GRID_SIZE};
use serde::Serialize;

const SIZE: usize = GRID_SIZE as usize;

/// One slot of the visible grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridSlot {
    /// Materialized cell.
    Cell(Cell),
    /// No cell exists for this slot.
    Empty,
}

impl GridSlot {
    pub fn cell(&self) -> Option<&Cell> {
        match self {
            Self::Cell(cell) => Some(cell),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Row-major 3x3 grid centered on the active cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub center_id: CellId,
    pub rows: [[GridSlot; SIZE]; SIZE],
}

impl GridView {
    pub(crate) fn from_fn(center_id: CellId, slot_at: impl FnMut(GridPos) -> GridSlot) -> Self {
        let mut slots = GridPos::all().map(slot_at);
        let rows = std::array::from_fn(|_| {
            std::array::from_fn(|_| slots.next().unwrap_or(GridSlot::Empty))
        });
        Self { center_id, rows }
    }

    pub fn slot(&self, pos: GridPos) -> &GridSlot {
        &self.rows[usize::from(pos.row())][usize::from(pos.col())]
    }

    /// Active center, or `None` when the center is missing.
    pub fn center(&self) -> Option<&Cell> {
        self.slot(GridPos::CENTER).cell()
    }

    /// Iterates all nine slots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &GridSlot)> {
        GridPos::all().map(move |pos| (pos, self.slot(pos)))
    }
}
