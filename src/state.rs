use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checksum::header_checksum;
use crate::parser::Table;
use crate::store::{StateStore, load_state, save_state};

/// Cookie name the checkbox state is persisted under.
pub const STATE_KEY: &str = "checkboxStates";

/// How long saved state lives, in days.
pub const STATE_TTL_DAYS: i64 = 30;

/// Checked flags for one tracked column, keyed by row index.
///
/// Keys are strings because the persisted form is a JSON object and row
/// indices become property names.
pub type CheckboxState = BTreeMap<String, bool>;

/// The single blob persisted in the state store.
///
/// `checksum` fingerprints the header row the state was saved against; on
/// load a mismatch means the table changed shape and the state is ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub checksum: String,
    pub columns: BTreeMap<String, CheckboxState>,
}

/// Which columns are rendered as checkboxes and persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedColumns {
    /// The last two columns of the header row. A single-column table tracks
    /// that column alone; an empty header tracks nothing.
    LastTwo,
    /// An explicit set of column indices.
    Explicit(Vec<usize>),
}

impl Default for TrackedColumns {
    fn default() -> Self {
        TrackedColumns::LastTwo
    }
}

impl TrackedColumns {
    /// Concrete column indices for a header of `header_len` fields.
    pub fn resolve(&self, header_len: usize) -> Vec<usize> {
        match self {
            TrackedColumns::LastTwo => match header_len {
                0 => Vec::new(),
                1 => vec![0],
                n => vec![n - 2, n - 1],
            },
            TrackedColumns::Explicit(columns) => {
                columns.iter().copied().filter(|&c| c < header_len).collect()
            }
        }
    }
}

/// Rendered checkboxes, as the state manager sees them.
///
/// Row identity is the table row index (data rows start at 1). Implementations
/// must ignore `set_checked` calls for coordinates that do not exist, so state
/// saved against a longer table applies cleanly to a shorter one.
pub trait CheckboxView {
    /// Every checkbox in `column` as `(row, checked)` pairs.
    fn checkboxes(&self, column: usize) -> Vec<(usize, bool)>;

    /// Set one checkbox. A no-op for unknown coordinates.
    fn set_checked(&mut self, row: usize, column: usize, checked: bool);
}

/// Whether saved state was applied to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NotLoaded,
}

/// Bridges the rendered table and the state store.
///
/// Owns the in-memory [`PersistedState`] lifecycle: builds it from the view,
/// writes it wholesale on every save, and validates the header checksum
/// before applying a loaded blob.
pub struct StateManager<S: StateStore> {
    store: S,
    tracked: TrackedColumns,
}

impl<S: StateStore> StateManager<S> {
    /// Manager tracking the last two columns (the default layout).
    pub fn new(store: S) -> Self {
        Self::with_tracked(store, TrackedColumns::default())
    }

    pub fn with_tracked(store: S, tracked: TrackedColumns) -> Self {
        StateManager { store, tracked }
    }

    pub fn tracked(&self) -> &TrackedColumns {
        &self.tracked
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the manager and return the store (the web layer turns the
    /// cookie-backed store back into a jar for the response).
    pub fn into_store(self) -> S {
        self.store
    }

    /// Snapshot the current checkbox state of every tracked column.
    ///
    /// A tracked column with no checkboxes still appears in the result as an
    /// empty map, so the persisted blob always names every tracked column.
    pub fn compute_state(&self, table: &Table, view: &dyn CheckboxView) -> PersistedState {
        let header_len = table.headers().map_or(0, |h| h.len());
        let checksum = header_checksum(table.headers().map_or(&[][..], |h| &h[..]));

        let mut columns = BTreeMap::new();
        for column in self.tracked.resolve(header_len) {
            let states: CheckboxState = view
                .checkboxes(column)
                .into_iter()
                .map(|(row, checked)| (row.to_string(), checked))
                .collect();
            columns.insert(column.to_string(), states);
        }

        PersistedState { checksum, columns }
    }

    /// Recompute the state from the view and persist it, replacing any
    /// previously saved blob.
    pub fn save(&mut self, table: &Table, view: &dyn CheckboxView) {
        let state = self.compute_state(table, view);
        save_state(&mut self.store, STATE_KEY, &state, STATE_TTL_DAYS);
    }

    /// Apply previously saved state to the view.
    ///
    /// Returns [`LoadOutcome::NotLoaded`] when there is no saved blob, when it
    /// fails to parse, or when its checksum does not match the current header
    /// row. Stored entries whose checkbox no longer exists are skipped.
    pub fn load(&self, table: &Table, view: &mut dyn CheckboxView) -> LoadOutcome {
        let Some(saved) = load_state::<_, PersistedState>(&self.store, STATE_KEY) else {
            return LoadOutcome::NotLoaded;
        };

        let current = header_checksum(table.headers().map_or(&[][..], |h| &h[..]));
        if saved.checksum != current {
            log::info!("table shape changed, ignoring saved checkbox state");
            return LoadOutcome::NotLoaded;
        }

        for (column_key, states) in &saved.columns {
            let Ok(column) = column_key.parse::<usize>() else {
                continue;
            };
            for (row_key, &checked) in states {
                let Ok(row) = row_key.parse::<usize>() else {
                    continue;
                };
                view.set_checked(row, column, checked);
            }
        }

        LoadOutcome::Loaded
    }

    /// Uncheck every checkbox in `column`, then recompute and save so the
    /// persisted blob matches the visible state.
    pub fn reset_column(&mut self, table: &Table, view: &mut dyn CheckboxView, column: usize) {
        for (row, _) in view.checkboxes(column) {
            view.set_checked(row, column, false);
        }
        self.save(table, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv;
    use crate::render::HtmlTable;
    use crate::store::MemoryStore;

    fn sample_table() -> Table {
        parse_csv("h1,h2,chkA,chkB\nr1,r2,x,y\ns1,s2,x,y\n")
    }

    fn view_for(table: &Table) -> HtmlTable {
        HtmlTable::new(table, &TrackedColumns::LastTwo)
    }

    #[test]
    fn last_two_resolution() {
        assert_eq!(TrackedColumns::LastTwo.resolve(4), vec![2, 3]);
        assert_eq!(TrackedColumns::LastTwo.resolve(2), vec![0, 1]);
        assert_eq!(TrackedColumns::LastTwo.resolve(1), vec![0]);
        assert_eq!(TrackedColumns::LastTwo.resolve(0), Vec::<usize>::new());
    }

    #[test]
    fn explicit_resolution_drops_out_of_range_columns() {
        let tracked = TrackedColumns::Explicit(vec![1, 5]);
        assert_eq!(tracked.resolve(4), vec![1]);
    }

    #[test]
    fn compute_state_covers_both_tracked_columns() {
        let table = sample_table();
        let mut view = view_for(&table);
        view.set_checked(1, 2, true);

        let manager = StateManager::new(MemoryStore::new());
        let state = manager.compute_state(&table, &view);

        assert_eq!(state.checksum, "-17705102");
        assert_eq!(state.columns.len(), 2);
        assert_eq!(state.columns["2"]["1"], true);
        assert_eq!(state.columns["2"]["2"], false);
        assert_eq!(state.columns["3"]["1"], false);
    }

    #[test]
    fn save_then_load_restores_a_checked_box() {
        let table = sample_table();
        let mut view = view_for(&table);
        view.set_checked(1, 2, true);

        let mut manager = StateManager::new(MemoryStore::new());
        manager.save(&table, &view);

        // Fresh render, as after a page reload: everything starts unchecked
        let mut reloaded = view_for(&table);
        assert_eq!(manager.load(&table, &mut reloaded), LoadOutcome::Loaded);
        assert_eq!(reloaded.checkboxes(2), vec![(1, true), (2, false)]);
        assert_eq!(reloaded.checkboxes(3), vec![(1, false), (2, false)]);
    }

    #[test]
    fn load_without_saved_state_is_not_loaded() {
        let table = sample_table();
        let mut view = view_for(&table);
        let manager = StateManager::new(MemoryStore::new());
        assert_eq!(manager.load(&table, &mut view), LoadOutcome::NotLoaded);
    }

    #[test]
    fn shape_change_discards_saved_state() {
        let old_table = sample_table();
        let mut view = view_for(&old_table);
        view.set_checked(1, 2, true);

        let mut manager = StateManager::new(MemoryStore::new());
        manager.save(&old_table, &view);

        // Same store, but the table grew a column
        let new_table = parse_csv("h1,h2,h3,chkA,chkB\nr1,r2,r3,x,y\n");
        let mut new_view = view_for(&new_table);
        assert_eq!(manager.load(&new_table, &mut new_view), LoadOutcome::NotLoaded);
        assert!(new_view.checkboxes(3).iter().all(|&(_, checked)| !checked));
        assert!(new_view.checkboxes(4).iter().all(|&(_, checked)| !checked));
    }

    #[test]
    fn corrupt_saved_blob_is_not_loaded() {
        let table = sample_table();
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, "{broken".to_string(), 30);

        let manager = StateManager::new(store);
        let mut view = view_for(&table);
        assert_eq!(manager.load(&table, &mut view), LoadOutcome::NotLoaded);
    }

    #[test]
    fn rows_missing_from_the_new_table_are_skipped() {
        let table = sample_table();
        let mut view = view_for(&table);
        view.set_checked(2, 3, true);

        let mut manager = StateManager::new(MemoryStore::new());
        manager.save(&table, &view);

        // Same headers, one data row fewer: row 2 has no checkbox anymore
        let short_table = parse_csv("h1,h2,chkA,chkB\nr1,r2,x,y\n");
        let mut short_view = view_for(&short_table);
        assert_eq!(manager.load(&short_table, &mut short_view), LoadOutcome::Loaded);
        assert_eq!(short_view.checkboxes(3), vec![(1, false)]);
    }

    #[test]
    fn reset_column_unchecks_and_persists() {
        let table = sample_table();
        let mut view = view_for(&table);
        view.set_checked(1, 2, true);
        view.set_checked(2, 2, true);
        view.set_checked(1, 3, true);

        let mut manager = StateManager::new(MemoryStore::new());
        manager.reset_column(&table, &mut view, 2);

        assert_eq!(view.checkboxes(2), vec![(1, false), (2, false)]);
        // The other tracked column is untouched
        assert_eq!(view.checkboxes(3), vec![(1, true), (2, false)]);

        // The persisted blob reflects the reset
        let mut reloaded = view_for(&table);
        assert_eq!(manager.load(&table, &mut reloaded), LoadOutcome::Loaded);
        assert_eq!(reloaded.checkboxes(2), vec![(1, false), (2, false)]);
        assert_eq!(reloaded.checkboxes(3), vec![(1, true), (2, false)]);
    }

    #[test]
    fn reset_column_is_idempotent() {
        let table = sample_table();
        let mut view = view_for(&table);
        view.set_checked(1, 2, true);

        let mut manager = StateManager::new(MemoryStore::new());
        manager.reset_column(&table, &mut view, 2);
        let first = manager.compute_state(&table, &view);

        manager.reset_column(&table, &mut view, 2);
        let second = manager.compute_state(&table, &view);

        assert_eq!(first, second);
        assert!(first.columns["2"].values().all(|&checked| !checked));
    }

    #[test]
    fn persisted_state_json_shape() {
        let table = sample_table();
        let mut view = view_for(&table);
        view.set_checked(1, 3, true);

        let manager = StateManager::new(MemoryStore::new());
        let state = manager.compute_state(&table, &view);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["checksum"], "-17705102");
        assert_eq!(json["columns"]["3"]["1"], true);
        assert_eq!(json["columns"]["2"]["1"], false);
    }
}
