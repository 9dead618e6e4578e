//! Core domain logic for the Mandala grid planner.
//! This crate is the single source of truth for chart invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cell::{
    child_cell_id, placeholder_text, Cell, CellId, CellTier, GridPos, GRID_SIZE,
    MAIN_THEME_PLACEHOLDER, ROOT_CELL_ID,
};
pub use model::chart::{ChartDecodeError, ChartValidationError, MandalaChart};
pub use model::grid::{GridSlot, GridView};
pub use repo::kv_repo::{KeyValueStore, KvRepoError, KvResult, SqliteKeyValueStore};
pub use service::chart_service::{
    ChartService, ChartServiceError, ChartServiceResult, EditSession, LoadSource,
    CHART_STORAGE_KEY,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
