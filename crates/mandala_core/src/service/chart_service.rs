//! Mandala chart use-case service.
//!
//! # Responsibility
//! - Load chart state from the key/value store, falling back to a fresh chart.
//! - Track the in-progress edit session.
//! - Persist full chart state after every mutating operation.
//!
//! # Invariants
//! - A pending edit is committed before any navigation is applied.
//! - A failed write never rolls back in-memory state.
//! - Cell text is never written to logs.

use crate::model::cell::CellId;
use crate::model::chart::MandalaChart;
use crate::model::grid::GridView;
use crate::repo::kv_repo::{KeyValueStore, KvRepoError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Storage key of the chart document.
pub const CHART_STORAGE_KEY: &str = "great7-mandala-chart-data";

/// Errors from chart service operations.
///
/// In-memory state has already been updated when either variant is
/// returned from a mutating call.
#[derive(Debug)]
pub enum ChartServiceError {
    /// Chart state could not be written to the store.
    PersistenceUnavailable(KvRepoError),
    /// Chart state could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl Display for ChartServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersistenceUnavailable(err) => write!(f, "persistence unavailable: {err}"),
            Self::Encode(err) => write!(f, "failed to encode chart state: {err}"),
        }
    }
}

impl Error for ChartServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersistenceUnavailable(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

/// Result type used by chart service operations.
pub type ChartServiceResult<T> = Result<T, ChartServiceError>;

/// How the chart was obtained when the service opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from the store.
    Persisted,
    /// Nothing stored yet.
    Fresh,
    /// Stored state was unreadable or malformed and was replaced.
    Recovered,
}

impl LoadSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Persisted => "persisted",
            Self::Fresh => "fresh",
            Self::Recovered => "recovered",
        }
    }
}

/// In-progress text edit on one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub cell_id: CellId,
    pub buffer: String,
}

/// Chart service facade.
pub struct ChartService<S: KeyValueStore> {
    store: S,
    storage_key: String,
    chart: MandalaChart,
    editing: Option<EditSession>,
    load_source: LoadSource,
}

impl<S: KeyValueStore> ChartService<S> {
    /// Opens the chart stored under [`CHART_STORAGE_KEY`].
    pub fn open(store: S) -> Self {
        Self::open_with_key(store, CHART_STORAGE_KEY)
    }

    /// Opens the chart stored under `storage_key`.
    ///
    /// Never fails: absent, unreadable or malformed state yields a fresh
    /// chart. Nothing is written until the first mutation.
    pub fn open_with_key(store: S, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let started_at = Instant::now();

        let (chart, load_source) = match store.load(&storage_key) {
            Ok(Some(raw)) => match MandalaChart::from_json(&raw) {
                Ok(chart) => (chart, LoadSource::Persisted),
                Err(err) => {
                    warn!(
                        "event=chart_load module=service status=fallback error_code=malformed_state error={err}"
                    );
                    (MandalaChart::initialize(), LoadSource::Recovered)
                }
            },
            Ok(None) => (MandalaChart::initialize(), LoadSource::Fresh),
            Err(err) => {
                warn!(
                    "event=chart_load module=service status=fallback error_code=persistence_unavailable error={err}"
                );
                (MandalaChart::initialize(), LoadSource::Recovered)
            }
        };

        info!(
            "event=chart_load module=service status=ok source={} cells={} duration_ms={}",
            load_source.as_str(),
            chart.cell_count(),
            started_at.elapsed().as_millis()
        );

        Self {
            store,
            storage_key,
            chart,
            editing: None,
            load_source,
        }
    }

    pub fn chart(&self) -> &MandalaChart {
        &self.chart
    }

    pub fn current_grid(&self) -> GridView {
        self.chart.current_grid()
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Starts editing `cell_id` and returns the seeded buffer.
    ///
    /// A pending edit on another cell is committed first. Re-selecting the
    /// cell already being edited keeps its buffer. Unknown ids open no
    /// session and return `Ok(None)`.
    pub fn begin_edit(&mut self, cell_id: &str) -> ChartServiceResult<Option<String>> {
        if let Some(session) = self.editing.as_ref().filter(|s| s.cell_id == cell_id) {
            return Ok(Some(session.buffer.clone()));
        }

        let committed = self.commit_pending_edit();
        let seed = self.chart.begin_edit(cell_id);
        if let Some(buffer) = seed.as_ref() {
            self.editing = Some(EditSession {
                cell_id: cell_id.to_string(),
                buffer: buffer.clone(),
            });
        }
        if committed {
            self.persist("begin_edit")?;
        }
        Ok(seed)
    }

    /// Replaces the buffer of the open session. `false` when none is open.
    pub fn update_edit(&mut self, text: impl Into<String>) -> bool {
        match self.editing.as_mut() {
            Some(session) => {
                session.buffer = text.into();
                true
            }
            None => false,
        }
    }

    /// Commits the open session. `Ok(false)` when none is open.
    pub fn finish_edit(&mut self) -> ChartServiceResult<bool> {
        if !self.commit_pending_edit() {
            return Ok(false);
        }
        self.persist("finish_edit")?;
        Ok(true)
    }

    /// Drops the open session without committing it.
    pub fn cancel_edit(&mut self) -> Option<EditSession> {
        self.editing.take()
    }

    /// Commits `new_text` to `cell_id` directly.
    ///
    /// An open session on the same cell is superseded. Unknown ids return
    /// `Ok(false)` and write nothing.
    pub fn commit_edit(&mut self, cell_id: &str, new_text: &str) -> ChartServiceResult<bool> {
        if !self.chart.commit_edit(cell_id, new_text) {
            debug!("event=chart_edit module=service status=noop reason=unknown_cell");
            return Ok(false);
        }
        if self
            .editing
            .as_ref()
            .is_some_and(|session| session.cell_id == cell_id)
        {
            self.editing = None;
        }
        self.persist("commit_edit")?;
        Ok(true)
    }

    /// Expands `cell_id` into the active center.
    pub fn expand(&mut self, cell_id: &str) -> ChartServiceResult<bool> {
        self.navigate("expand", |chart| chart.expand(cell_id))
    }

    /// Navigates to the parent of the active center.
    pub fn go_back(&mut self) -> ChartServiceResult<bool> {
        self.navigate("go_back", MandalaChart::go_back)
    }

    /// Navigates directly to the root.
    pub fn go_to_root(&mut self) -> ChartServiceResult<bool> {
        self.navigate("go_to_root", MandalaChart::go_to_root)
    }

    /// Replaces the chart with a fresh one and drops any edit session.
    pub fn reset(&mut self) -> ChartServiceResult<()> {
        self.editing = None;
        self.chart = MandalaChart::initialize();
        info!("event=chart_reset module=service status=ok");
        self.persist("reset")
    }

    /// Writes full chart state to the store.
    pub fn save(&self) -> ChartServiceResult<()> {
        self.persist("save")
    }

    fn navigate(
        &mut self,
        op: &'static str,
        apply: impl FnOnce(&mut MandalaChart) -> bool,
    ) -> ChartServiceResult<bool> {
        let committed = self.commit_pending_edit();
        let moved = apply(&mut self.chart);
        if moved {
            debug!(
                "event=chart_navigate module=service status=ok op={op} depth={}",
                self.chart.breadcrumb().len()
            );
        } else {
            debug!("event=chart_navigate module=service status=noop op={op}");
        }
        if committed || moved {
            self.persist(op)?;
        }
        Ok(moved)
    }

    fn commit_pending_edit(&mut self) -> bool {
        match self.editing.take() {
            Some(session) => self.chart.commit_edit(&session.cell_id, &session.buffer),
            None => false,
        }
    }

    fn persist(&self, op: &'static str) -> ChartServiceResult<()> {
        let started_at = Instant::now();
        let payload = self.chart.to_json().map_err(ChartServiceError::Encode)?;
        match self.store.save(&self.storage_key, &payload) {
            Ok(()) => {
                debug!(
                    "event=chart_save module=service status=ok op={op} cells={} bytes={} duration_ms={}",
                    self.chart.cell_count(),
                    payload.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=chart_save module=service status=error op={op} error_code=persistence_unavailable error={err}"
                );
                Err(ChartServiceError::PersistenceUnavailable(err))
            }
        }
    }
}
