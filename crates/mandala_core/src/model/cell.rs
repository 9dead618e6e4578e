//! Grid cell model.
//!
//! # Responsibility
//! - Define the node record stored in the flat chart cell map.
//! - Derive child ids and placeholder labels from grid position.
//!
//! # Invariants
//! - Only the root uses the sentinel id; every other id is
//!   `{parent_id}_{row}_{col}`.
//! - Placeholder labels are computed from tier and position, never stored
//!   as a separate field.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable cell identifier.
///
/// Kept as a type alias so the persisted JSON keeps plain string ids.
pub type CellId = String;

/// Fixed id of the single root cell.
pub const ROOT_CELL_ID: &str = "main_center";

/// Side length of every grid.
pub const GRID_SIZE: u8 = 3;

/// Placeholder label of the root cell.
pub const MAIN_THEME_PLACEHOLDER: &str = "Main Theme";

/// Row/column position of a cell inside its parent's grid.
///
/// Coordinates are private so every value stays inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    row: u8,
    col: u8,
}

impl GridPos {
    /// Middle slot, always occupied by the grid's center cell.
    pub const CENTER: GridPos = GridPos {
        row: GRID_SIZE / 2,
        col: GRID_SIZE / 2,
    };

    /// Returns a position when both coordinates are inside the grid.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    pub fn is_center(self) -> bool {
        self == Self::CENTER
    }

    /// 1-based row-major slot number used by placeholder labels.
    pub fn ordinal(self) -> u8 {
        self.row * GRID_SIZE + self.col + 1
    }

    /// All nine positions in row-major order.
    pub fn all() -> impl Iterator<Item = GridPos> {
        (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |col| GridPos { row, col }))
    }

    /// The eight non-center positions in row-major order.
    pub fn surrounding() -> impl Iterator<Item = GridPos> {
        Self::all().filter(|pos| !pos.is_center())
    }
}

impl Display for GridPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Placeholder family of a cell, decided by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTier {
    /// The root cell.
    Root,
    /// Direct child of the root.
    SubTheme,
    /// Any deeper cell.
    Item,
}

impl CellTier {
    /// Resolves the tier from a cell's parent id.
    pub fn for_parent(parent_id: Option<&str>) -> Self {
        match parent_id {
            None => Self::Root,
            Some(ROOT_CELL_ID) => Self::SubTheme,
            Some(_) => Self::Item,
        }
    }
}

/// Computes the placeholder label for a tier and grid position.
///
/// Non-root cells always carry a position; a missing one falls back to the
/// root label.
pub fn placeholder_text(tier: CellTier, pos: Option<GridPos>) -> String {
    match (tier, pos) {
        (CellTier::SubTheme, Some(pos)) => format!("Sub-theme {}", pos.ordinal()),
        (CellTier::Item, Some(pos)) => format!("Item {}", pos.ordinal()),
        (CellTier::Root, _) | (_, None) => MAIN_THEME_PLACEHOLDER.to_string(),
    }
}

/// Derives the id of the child at `pos` in `parent_id`'s grid.
pub fn child_cell_id(parent_id: &str, pos: GridPos) -> CellId {
    format!("{parent_id}_{}_{}", pos.row, pos.col)
}

/// One labeled node of the chart hierarchy.
///
/// Field names serialize in camelCase to match the stored chart payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: CellId,
    /// `None` only for the root.
    pub parent_id: Option<CellId>,
    /// User label. Empty text renders as the placeholder.
    pub text: String,
    /// True iff this cell is the active center.
    #[serde(default)]
    pub is_center_topic: bool,
    /// True iff this cell is not the active center.
    #[serde(default)]
    pub is_expandable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_row: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_col: Option<u8>,
}

impl Cell {
    /// Creates the root cell as the active center.
    pub fn root() -> Self {
        Self {
            id: ROOT_CELL_ID.to_string(),
            parent_id: None,
            text: MAIN_THEME_PLACEHOLDER.to_string(),
            is_center_topic: true,
            is_expandable: false,
            grid_row: None,
            grid_col: None,
        }
    }

    /// Creates an expandable child of `parent_id` with placeholder text.
    pub fn child(parent_id: &str, pos: GridPos) -> Self {
        Self {
            id: child_cell_id(parent_id, pos),
            parent_id: Some(parent_id.to_string()),
            text: placeholder_text(CellTier::for_parent(Some(parent_id)), Some(pos)),
            is_center_topic: false,
            is_expandable: true,
            grid_row: Some(pos.row),
            grid_col: Some(pos.col),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns the grid position when both coordinates are set and valid.
    pub fn position(&self) -> Option<GridPos> {
        match (self.grid_row, self.grid_col) {
            (Some(row), Some(col)) => GridPos::new(row, col),
            _ => None,
        }
    }

    pub fn tier(&self) -> CellTier {
        CellTier::for_parent(self.parent_id.as_deref())
    }

    pub fn placeholder(&self) -> String {
        placeholder_text(self.tier(), self.position())
    }

    /// Whether the stored text is exactly the position-derived default.
    pub fn has_placeholder_text(&self) -> bool {
        self.text == self.placeholder()
    }

    /// Whether the user has written something other than the default.
    pub fn has_custom_text(&self) -> bool {
        !self.text.trim().is_empty() && !self.has_placeholder_text()
    }

    /// Text for rendering; empty text falls back to the placeholder.
    pub fn display_text(&self) -> String {
        if self.text.is_empty() {
            self.placeholder()
        } else {
            self.text.clone()
        }
    }

    pub(crate) fn set_center(&mut self, is_center: bool) {
        self.is_center_topic = is_center;
        self.is_expandable = !is_center;
    }
}
