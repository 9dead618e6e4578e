//! Hierarchical grid store.
//!
//! # Responsibility
//! - Own the flat cell map and the active-center pointer.
//! - Provide navigation, editing and read operations over the hierarchy.
//! - Validate state decoded from persisted JSON.
//!
//! # Invariants
//! - Exactly one cell has `is_center_topic = true`: the active center.
//! - Children are materialized lazily, all eight at once, on first expand.
//! - Cells are never removed; navigation only flips center flags.
//! - Unknown cell ids are silent no-ops.

use crate::model::cell::{child_cell_id, Cell, CellId, GridPos, ROOT_CELL_ID};
use crate::model::grid::{GridSlot, GridView};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tagline appended to the share message.
pub const SHARE_TAGLINE: &str = "Unlocking deeper insights, one square at a time.";

static CELL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^main_center(?:_(?:[02]_[0-2]|1_[02]))*$").expect("valid cell id regex")
});

/// Structural problems found in decoded chart state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartValidationError {
    /// Root cell is absent.
    MissingRoot,
    /// Root cell has a parent or a grid position.
    MalformedRoot,
    /// Active center pointer references a missing cell.
    MissingActiveCenter(CellId),
    /// Map key differs from the stored cell id.
    KeyMismatch { key: CellId, id: CellId },
    /// Id does not follow the `{parent}_{row}_{col}` grammar.
    MalformedId(CellId),
    /// Parent/position fields disagree with the id.
    InconsistentIdentity(CellId),
    /// Parent referenced by a cell does not exist.
    MissingParent { id: CellId, parent_id: CellId },
    /// Center flags disagree with the active pointer.
    CenterMismatch(CellId),
}

impl Display for ChartValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "chart has no root cell"),
            Self::MalformedRoot => write!(f, "root cell must have no parent and no position"),
            Self::MissingActiveCenter(id) => write!(f, "active center not found: {id}"),
            Self::KeyMismatch { key, id } => {
                write!(f, "cell stored under key `{key}` has id `{id}`")
            }
            Self::MalformedId(id) => write!(f, "malformed cell id: {id}"),
            Self::InconsistentIdentity(id) => {
                write!(f, "cell parent/position disagree with id: {id}")
            }
            Self::MissingParent { id, parent_id } => {
                write!(f, "cell {id} references missing parent {parent_id}")
            }
            Self::CenterMismatch(id) => {
                write!(f, "center flags of cell {id} disagree with the active center")
            }
        }
    }
}

impl Error for ChartValidationError {}

/// Errors from decoding persisted chart JSON.
#[derive(Debug)]
pub enum ChartDecodeError {
    /// Payload is not valid chart JSON.
    Json(serde_json::Error),
    /// Payload parsed but breaks structural invariants.
    Invalid(ChartValidationError),
}

impl Display for ChartDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid chart json: {err}"),
            Self::Invalid(err) => write!(f, "invalid chart state: {err}"),
        }
    }
}

impl Error for ChartDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ChartDecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ChartValidationError> for ChartDecodeError {
    fn from(value: ChartValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Flat cell map plus the pointer to the cell whose grid is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandalaChart {
    cells: BTreeMap<CellId, Cell>,
    active_center_id: CellId,
}

impl Default for MandalaChart {
    fn default() -> Self {
        Self::initialize()
    }
}

impl MandalaChart {
    /// Builds a fresh chart: root as active center plus its eight sub-themes.
    pub fn initialize() -> Self {
        let root = Cell::root();
        let mut chart = Self {
            active_center_id: root.id.clone(),
            cells: BTreeMap::from([(root.id.clone(), root)]),
        };
        chart.materialize_children(ROOT_CELL_ID);
        chart
    }

    /// Decodes, validates and normalizes persisted chart JSON.
    ///
    /// Center flags are recomputed from the active pointer, so only
    /// structural damage is rejected.
    pub fn from_json(raw: &str) -> Result<Self, ChartDecodeError> {
        let mut chart: Self = serde_json::from_str(raw)?;
        chart.normalize_center_flags();
        chart.validate()?;
        Ok(chart)
    }

    /// Encodes full chart state as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn root_id(&self) -> &str {
        ROOT_CELL_ID
    }

    pub fn active_center_id(&self) -> &str {
        &self.active_center_id
    }

    pub fn cell(&self, cell_id: &str) -> Option<&Cell> {
        self.cells.get(cell_id)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn active_center(&self) -> Option<&Cell> {
        self.cells.get(&self.active_center_id)
    }

    pub fn is_at_root(&self) -> bool {
        self.active_center_id == ROOT_CELL_ID
    }

    /// Parent of the active center, used for the "back to" affordance.
    pub fn parent_of_active(&self) -> Option<&Cell> {
        self.active_center()?
            .parent_id
            .as_deref()
            .and_then(|parent_id| self.cells.get(parent_id))
    }

    /// Snapshot of the visible 3x3 grid.
    pub fn current_grid(&self) -> GridView {
        let center_id = self.active_center_id.clone();
        GridView::from_fn(center_id, |pos| {
            let cell = if pos.is_center() {
                self.active_center()
            } else {
                self.cells.get(&child_cell_id(&self.active_center_id, pos))
            };
            cell.cloned().map_or(GridSlot::Empty, GridSlot::Cell)
        })
    }

    /// Returns the seed for an edit buffer.
    ///
    /// Placeholder text seeds an empty buffer. `None` for unknown ids.
    pub fn begin_edit(&self, cell_id: &str) -> Option<String> {
        let cell = self.cells.get(cell_id)?;
        if cell.has_placeholder_text() {
            Some(String::new())
        } else {
            Some(cell.text.clone())
        }
    }

    /// Stores trimmed text, reverting to the placeholder when blank.
    ///
    /// Returns `false` for unknown ids.
    pub fn commit_edit(&mut self, cell_id: &str, new_text: &str) -> bool {
        let Some(cell) = self.cells.get_mut(cell_id) else {
            return false;
        };
        let trimmed = new_text.trim();
        cell.text = if trimmed.is_empty() {
            cell.placeholder()
        } else {
            trimmed.to_string()
        };
        true
    }

    /// Makes `cell_id` the active center, materializing its children first.
    ///
    /// Returns `false` for unknown ids or the current active center.
    pub fn expand(&mut self, cell_id: &str) -> bool {
        if cell_id == self.active_center_id || !self.cells.contains_key(cell_id) {
            return false;
        }
        self.materialize_children(cell_id);
        self.activate(cell_id)
    }

    /// Navigates to the parent of the active center. No-op at root.
    pub fn go_back(&mut self) -> bool {
        let Some(parent_id) = self
            .active_center()
            .and_then(|center| center.parent_id.clone())
        else {
            return false;
        };
        self.activate(&parent_id)
    }

    /// Navigates straight to the root. No-op at root.
    pub fn go_to_root(&mut self) -> bool {
        if self.is_at_root() {
            return false;
        }
        self.activate(ROOT_CELL_ID)
    }

    /// Whether any materialized child of `cell_id` carries user text.
    pub fn has_expanded_detail(&self, cell_id: &str) -> bool {
        if !self.cells.contains_key(cell_id) {
            return false;
        }
        GridPos::surrounding()
            .filter_map(|pos| self.cells.get(&child_cell_id(cell_id, pos)))
            .any(Cell::has_custom_text)
    }

    /// Rendering text for a cell; placeholder when stored text is empty.
    pub fn display_text(&self, cell_id: &str) -> Option<String> {
        self.cells.get(cell_id).map(Cell::display_text)
    }

    /// Cells from the root down to the active center, inclusive.
    pub fn breadcrumb(&self) -> Vec<&Cell> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = self.active_center();
        while let Some(cell) = cursor {
            if !visited.insert(cell.id.as_str()) {
                break;
            }
            path.push(cell);
            cursor = cell
                .parent_id
                .as_deref()
                .and_then(|parent_id| self.cells.get(parent_id));
        }
        path.reverse();
        path
    }

    /// Short human-readable summary of the active center for sharing.
    pub fn share_message(&self) -> String {
        match self.active_center() {
            Some(center) => format!(
                "My Mandala Chart is centered on \"{}\". {SHARE_TAGLINE}",
                center.display_text()
            ),
            None => "Exploring ideas with my Mandala Chart!".to_string(),
        }
    }

    /// Checks structural invariants of the cell map.
    ///
    /// # Errors
    /// - Returns the first violation found; cells are checked in id order.
    pub fn validate(&self) -> Result<(), ChartValidationError> {
        let root = self
            .cells
            .get(ROOT_CELL_ID)
            .ok_or(ChartValidationError::MissingRoot)?;
        if root.parent_id.is_some() || root.grid_row.is_some() || root.grid_col.is_some() {
            return Err(ChartValidationError::MalformedRoot);
        }
        if !self.cells.contains_key(&self.active_center_id) {
            return Err(ChartValidationError::MissingActiveCenter(
                self.active_center_id.clone(),
            ));
        }

        for (key, cell) in &self.cells {
            let is_active = cell.id == self.active_center_id;
            if cell.is_center_topic != is_active || cell.is_expandable == is_active {
                return Err(ChartValidationError::CenterMismatch(cell.id.clone()));
            }
            if *key != cell.id {
                return Err(ChartValidationError::KeyMismatch {
                    key: key.clone(),
                    id: cell.id.clone(),
                });
            }
            if cell.id == ROOT_CELL_ID {
                continue;
            }
            if !CELL_ID_RE.is_match(&cell.id) {
                return Err(ChartValidationError::MalformedId(cell.id.clone()));
            }
            let (Some(parent_id), Some(pos)) = (cell.parent_id.as_deref(), cell.position()) else {
                return Err(ChartValidationError::InconsistentIdentity(cell.id.clone()));
            };
            if pos.is_center() || child_cell_id(parent_id, pos) != cell.id {
                return Err(ChartValidationError::InconsistentIdentity(cell.id.clone()));
            }
            if !self.cells.contains_key(parent_id) {
                return Err(ChartValidationError::MissingParent {
                    id: cell.id.clone(),
                    parent_id: parent_id.to_string(),
                });
            }
        }
        Ok(())
    }

    fn materialize_children(&mut self, parent_id: &str) {
        for pos in GridPos::surrounding() {
            let child_id = child_cell_id(parent_id, pos);
            if !self.cells.contains_key(&child_id) {
                self.cells.insert(child_id, Cell::child(parent_id, pos));
            }
        }
    }

    fn activate(&mut self, target_id: &str) -> bool {
        if target_id == self.active_center_id || !self.cells.contains_key(target_id) {
            return false;
        }
        if let Some(previous) = self.cells.get_mut(&self.active_center_id) {
            previous.set_center(false);
        }
        if let Some(target) = self.cells.get_mut(target_id) {
            target.set_center(true);
        }
        self.active_center_id = target_id.to_string();
        true
    }

    fn normalize_center_flags(&mut self) {
        for cell in self.cells.values_mut() {
            let is_center = cell.id == self.active_center_id;
            cell.set_center(is_center);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartDecodeError, ChartValidationError, MandalaChart};
    use crate::model::cell::ROOT_CELL_ID;

    #[test]
    fn initialize_creates_root_and_eight_sub_themes() {
        let chart = MandalaChart::initialize();
        assert_eq!(chart.cell_count(), 9);
        assert_eq!(chart.active_center_id(), ROOT_CELL_ID);
        assert!(chart.validate().is_ok());

        let root = chart.cell(ROOT_CELL_ID).unwrap();
        assert!(root.is_center_topic);
        assert!(!root.is_expandable);
        assert_eq!(root.text, "Main Theme");
    }

    #[test]
    fn from_json_recomputes_center_flags() {
        let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
        value["cells"]["main_center_0_0"]["isCenterTopic"] = true.into();
        value["cells"][ROOT_CELL_ID]["isExpandable"] = true.into();

        let chart = MandalaChart::from_json(&value.to_string()).unwrap();
        let flagged: Vec<&str> = chart
            .cells()
            .filter(|cell| cell.is_center_topic)
            .map(|cell| cell.id.as_str())
            .collect();
        assert_eq!(flagged, vec![ROOT_CELL_ID]);
        assert!(!chart.cell(ROOT_CELL_ID).unwrap().is_expandable);
    }

    #[test]
    fn validate_rejects_second_center_topic() {
        let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
        value["cells"]["main_center_0_0"]["isCenterTopic"] = true.into();

        let chart: MandalaChart = serde_json::from_value(value).unwrap();
        assert_eq!(
            chart.validate(),
            Err(ChartValidationError::CenterMismatch(
                "main_center_0_0".to_string()
            ))
        );
    }

    #[test]
    fn validate_rejects_flags_that_miss_the_pointer() {
        let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
        value["cells"][ROOT_CELL_ID]["isCenterTopic"] = false.into();
        value["cells"]["main_center_2_2"]["isExpandable"] = false.into();

        let chart: MandalaChart = serde_json::from_value(value).unwrap();
        assert!(matches!(
            chart.validate(),
            Err(ChartValidationError::CenterMismatch(_))
        ));
    }

    #[test]
    fn from_json_rejects_center_slot_child() {
        let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
        value["cells"]["main_center_1_1"] = serde_json::json!({
            "id": "main_center_1_1",
            "parentId": ROOT_CELL_ID,
            "text": "center?",
            "gridRow": 1,
            "gridCol": 1
        });

        let err = MandalaChart::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            ChartDecodeError::Invalid(ChartValidationError::MalformedId(id)) if id == "main_center_1_1"
        ));
    }

    #[test]
    fn from_json_rejects_orphan_cell() {
        let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
        value["cells"]["main_center_0_0_2_2"] = serde_json::json!({
            "id": "main_center_0_0_2_2",
            "parentId": "main_center_0_0",
            "text": "orphan",
            "gridRow": 2,
            "gridCol": 2
        });
        value["cells"]
            .as_object_mut()
            .unwrap()
            .remove("main_center_0_0");

        let err = MandalaChart::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            ChartDecodeError::Invalid(ChartValidationError::MissingParent { .. })
        ));
    }

    #[test]
    fn from_json_rejects_missing_active_center() {
        let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
        value["activeCenterId"] = "main_center_2_2_0_0".into();

        let err = MandalaChart::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            ChartDecodeError::Invalid(ChartValidationError::MissingActiveCenter(_))
        ));
    }

    #[test]
    fn from_json_rejects_non_json() {
        let err = MandalaChart::from_json("{not json").unwrap_err();
        assert!(matches!(err, ChartDecodeError::Json(_)));
    }

    #[test]
    fn breadcrumb_walks_from_root_to_active() {
        let mut chart = MandalaChart::initialize();
        chart.expand("main_center_2_0");
        chart.expand("main_center_2_0_0_1");

        let ids: Vec<&str> = chart
            .breadcrumb()
            .into_iter()
            .map(|cell| cell.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![ROOT_CELL_ID, "main_center_2_0", "main_center_2_0_0_1"]
        );
        assert_eq!(chart.parent_of_active().unwrap().id, "main_center_2_0");
    }

    #[test]
    fn share_message_uses_center_text() {
        let mut chart = MandalaChart::initialize();
        chart.commit_edit(ROOT_CELL_ID, "Become a better engineer");
        assert_eq!(
            chart.share_message(),
            "My Mandala Chart is centered on \"Become a better engineer\". Unlocking deeper insights, one square at a time."
        );
    }
}
