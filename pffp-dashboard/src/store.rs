//! Record store, filter state and refresh handling
//!
//! The store keeps an immutable [`Snapshot`] of the last successful fetch.
//! A refresh swaps the snapshot and resets the filters under one write lock,
//! so readers see either the old or the new state, never a mix. Only one
//! fetch may be outstanding; a second refresh is rejected while it runs.
//! A failed fetch leaves the snapshot untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use pffp_common::engine::{
    apply_filters, build_filter_options, compute_charts, compute_kpis, ChartSet,
    FilterDimension, FilterOptions, FilterState, Kpi, SpeciesMatch,
};
use pffp_common::models::{AdminUnit, ProgramRecord, SpeciesRecord};
use pffp_common::Language;

use crate::source::{DataSource, FeedData, FetchError};

/// Refresh errors
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Another fetch has not completed yet
    #[error("A data refresh is already in progress")]
    InFlight,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Immutable result of one successful fetch
#[derive(Debug, Default)]
pub struct Snapshot {
    pub records: Vec<ProgramRecord>,
    pub species: Vec<SpeciesRecord>,
    pub admin: Vec<AdminUnit>,
    /// `None` until the first successful fetch
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn from_feed(feed: FeedData) -> Self {
        Self {
            records: feed.records,
            species: feed.species,
            admin: feed.admin,
            loaded_at: Some(Utc::now()),
        }
    }
}

/// Outcome of a successful refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub records: usize,
    pub species: usize,
    pub admin_units: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Consistent (snapshot, filters, language) triple for one computation
#[derive(Debug, Clone)]
pub struct CurrentView {
    pub snapshot: Arc<Snapshot>,
    pub filters: FilterState,
    pub language: Language,
    pub species_match: SpeciesMatch,
}

impl CurrentView {
    pub fn filtered(&self) -> Vec<&ProgramRecord> {
        apply_filters(&self.snapshot.records, &self.filters, self.species_match)
    }
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub loading: bool,
    pub language: Language,
    pub filters: FilterState,
    pub kpis: Kpi,
    pub charts: ChartSet,
    pub filter_options: FilterOptions,
    pub filtered_records: usize,
    pub total_records: usize,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct DashboardState {
    snapshot: Arc<Snapshot>,
    filters: FilterState,
    language: Language,
    last_error: Option<String>,
}

/// Clears the loading flag when the fetch finishes or is abandoned
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sole owner of the fetched program data and the filter state
pub struct Dashboard {
    source: Arc<dyn DataSource>,
    species_match: SpeciesMatch,
    loading: AtomicBool,
    state: RwLock<DashboardState>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn DataSource>, language: Language, species_match: SpeciesMatch) -> Self {
        Self {
            source,
            species_match,
            loading: AtomicBool::new(false),
            state: RwLock::new(DashboardState {
                snapshot: Arc::new(Snapshot::default()),
                filters: FilterState::default(),
                language,
                last_error: None,
            }),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Fetch a new snapshot and reset the filters
    ///
    /// The filters are reset whatever the outcome; the snapshot is only
    /// replaced on success.
    pub async fn refresh(&self) -> Result<RefreshSummary, RefreshError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Refresh requested while a fetch is outstanding");
            return Err(RefreshError::InFlight);
        }
        let _loading = LoadingGuard(&self.loading);

        info!("Fetching program data");
        let result = self.source.fetch().await;

        let mut state = self.state.write().await;
        state.filters.reset();

        match result {
            Ok(feed) => {
                let snapshot = Snapshot::from_feed(feed);
                let summary = RefreshSummary {
                    records: snapshot.records.len(),
                    species: snapshot.species.len(),
                    admin_units: snapshot.admin.len(),
                    loaded_at: snapshot.loaded_at.unwrap_or_else(Utc::now),
                };
                state.snapshot = Arc::new(snapshot);
                state.last_error = None;

                info!(
                    records = summary.records,
                    species = summary.species,
                    admin_units = summary.admin_units,
                    "✓ Program data loaded"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "Could not load data; keeping previous snapshot");
                state.last_error = Some(format!("Could not load data: {}", e));
                Err(RefreshError::Fetch(e))
            }
        }
    }

    fn current_from(&self, state: &DashboardState) -> CurrentView {
        CurrentView {
            snapshot: Arc::clone(&state.snapshot),
            filters: state.filters.clone(),
            language: state.language,
            species_match: self.species_match,
        }
    }

    pub async fn current(&self) -> CurrentView {
        let state = self.state.read().await;
        self.current_from(&state)
    }

    /// Recompute the full dashboard from the current state
    pub async fn view(&self) -> DashboardView {
        let (current, last_error) = {
            let state = self.state.read().await;
            (self.current_from(&state), state.last_error.clone())
        };
        let snapshot = &current.snapshot;
        let filtered = current.filtered();

        DashboardView {
            loading: self.is_loading(),
            language: current.language,
            filters: current.filters.clone(),
            kpis: compute_kpis(&snapshot.records, &filtered),
            charts: compute_charts(&filtered, current.language),
            filter_options: build_filter_options(&snapshot.records, &snapshot.admin, current.language),
            filtered_records: filtered.len(),
            total_records: snapshot.records.len(),
            loaded_at: snapshot.loaded_at,
            last_error,
        }
    }

    pub async fn filters(&self) -> FilterState {
        self.state.read().await.filters.clone()
    }

    /// Change one filter slot; an empty value clears it
    pub async fn set_filter(
        &self,
        dimension: FilterDimension,
        value: &str,
    ) -> pffp_common::Result<FilterState> {
        let mut state = self.state.write().await;
        state.filters.set(dimension, value)?;
        info!(dimension = %dimension, value = %value, "Filter changed");
        Ok(state.filters.clone())
    }

    pub async fn reset_filters(&self) -> FilterState {
        let mut state = self.state.write().await;
        state.filters.reset();
        info!("Filters reset");
        state.filters.clone()
    }

    pub async fn language(&self) -> Language {
        self.state.read().await.language
    }

    /// Switch display language; never refetches
    pub async fn set_language(&self, language: Language) -> Language {
        let mut state = self.state.write().await;
        state.language = language;
        language
    }

    pub async fn toggle_language(&self) -> Language {
        let mut state = self.state.write().await;
        state.language = state.language.toggled();
        info!(language = %state.language, "Display language toggled");
        state.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Serves a fixed feed, optionally failing from the nth call on
    struct ScriptedSource {
        feed: FeedData,
        fail_after: Option<usize>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        async fn fetch(&self) -> Result<FeedData, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_after {
                Some(n) if call >= n => Err(FetchError::Status(500, "Internal Server Error".into())),
                _ => Ok(self.feed.clone()),
            }
        }
    }

    /// Blocks until released, to hold a fetch open
    struct GatedSource {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl DataSource for GatedSource {
        async fn fetch(&self) -> Result<FeedData, FetchError> {
            self.release.notified().await;
            Ok(FeedData::default())
        }
    }

    fn feed() -> FeedData {
        FeedData {
            records: serde_json::from_value(json!([
                {"Farmer_ID": "SL001", "Status": "Act", "Plot_Id": "P1", "Area (ha)": "2.5",
                 "Village_Name": "Thon A", "Year": 2023},
                {"Farmer_ID": "WF002", "Status": "Act", "Village_Name": "Thon B", "Year": 2024}
            ]))
            .unwrap(),
            ..Default::default()
        }
    }

    fn dashboard(fail_after: Option<usize>) -> Dashboard {
        let source = ScriptedSource {
            feed: feed(),
            fail_after,
            calls: AtomicUsize::new(0),
        };
        Dashboard::new(Arc::new(source), Language::Vi, SpeciesMatch::Token)
    }

    #[tokio::test]
    async fn test_refresh_loads_snapshot() {
        let dashboard = dashboard(None);
        let summary = dashboard.refresh().await.unwrap();
        assert_eq!(summary.records, 2);

        let view = dashboard.view().await;
        assert_eq!(view.total_records, 2);
        assert_eq!(view.kpis.total_farmers, 2);
        assert!(view.loaded_at.is_some());
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot_and_resets_filters() {
        let dashboard = dashboard(Some(1));
        dashboard.refresh().await.unwrap();
        dashboard.set_filter(FilterDimension::Year, "2023").await.unwrap();

        let err = dashboard.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Fetch(FetchError::Status(500, _))));

        let view = dashboard.view().await;
        assert_eq!(view.total_records, 2);
        assert!(view.filters.is_empty());
        assert!(view.last_error.unwrap().contains("Could not load data"));
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_filter_changes_only_affect_filtered_figures() {
        let dashboard = dashboard(None);
        dashboard.refresh().await.unwrap();

        dashboard.set_filter(FilterDimension::Year, "2024").await.unwrap();
        let view = dashboard.view().await;
        assert_eq!(view.filtered_records, 1);
        assert_eq!(view.kpis.total_villages, 1);
        assert_eq!(view.kpis.total_farmers, 2);
        assert_eq!(view.filter_options.year.len(), 2);

        dashboard.reset_filters().await;
        assert_eq!(dashboard.view().await.filtered_records, 2);
    }

    #[tokio::test]
    async fn test_filter_options_unchanged_by_filters() {
        let dashboard = dashboard(None);
        dashboard.refresh().await.unwrap();
        let before = dashboard.view().await.filter_options;

        dashboard.set_filter(FilterDimension::FarmerId, "WF002").await.unwrap();
        dashboard.set_filter(FilterDimension::Year, "2024").await.unwrap();
        let view = dashboard.view().await;

        assert_eq!(view.filtered_records, 1);
        assert_eq!(view.filter_options, before);
        assert_eq!(view.filter_options.farmer_id.len(), 2);
        assert_eq!(view.filter_options.year.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_filter_value_leaves_state_unchanged() {
        let dashboard = dashboard(None);
        assert!(dashboard.set_filter(FilterDimension::Project, "ACME").await.is_err());
        assert!(dashboard.filters().await.is_empty());
    }

    #[tokio::test]
    async fn test_language_toggle_does_not_refetch() {
        let dashboard = dashboard(Some(1));
        dashboard.refresh().await.unwrap();
        assert_eq!(dashboard.toggle_language().await, Language::En);
        assert_eq!(dashboard.language().await, Language::En);
        assert_eq!(dashboard.view().await.total_records, 2);
        assert_eq!(dashboard.set_language(Language::Vi).await, Language::Vi);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_rejected() {
        let release = Arc::new(Notify::new());
        let dashboard = Arc::new(Dashboard::new(
            Arc::new(GatedSource {
                release: Arc::clone(&release),
            }),
            Language::Vi,
            SpeciesMatch::Token,
        ));

        let first = {
            let dashboard = Arc::clone(&dashboard);
            tokio::spawn(async move { dashboard.refresh().await })
        };

        while !dashboard.is_loading() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(dashboard.refresh().await, Err(RefreshError::InFlight)));

        release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert!(!dashboard.is_loading());
    }
}
