//! Season-count backfill and watched-seasons reconciliation over a user's series.
//!
//! Items are processed strictly one after another. Every catalog call, successful or not,
//! is followed by a fixed pause so the catalog never sees more than one request in flight
//! and requests stay evenly spaced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use watch_config::MigrationConfig;
use watch_models::{fields, MediaKind, SeriesItem};
use watch_sources::{CatalogLookup, ProgressTracker};
use crate::patch::FieldPatch;
use crate::store::{user_series_filters, DocumentStore, StoreError, StoredDocument};


pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);
const DEFAULT_PROGRESS_INTERVAL: usize = 25;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// The user's series could not be listed; nothing was processed
    #[error("failed to enumerate series for user {user_id}: {source}")]
    Enumeration {
        user_id: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationOutcome {
    Updated,
    Skipped,
    Failed,
}

impl std::fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MigrationOutcome::Updated => "updated",
            MigrationOutcome::Skipped => "skipped",
            MigrationOutcome::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Why an item ended up as failed.
///
/// The counters treat all of these alike; the reason is kept for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    LookupNotFound,
    LookupFailed(String),
    PersistFailed(String),
    InvalidDocument(String),
}

impl FailureReason {
    pub fn category(&self) -> &'static str {
        match self {
            FailureReason::LookupNotFound => "lookup_not_found",
            FailureReason::LookupFailed(_) => "lookup_failed",
            FailureReason::PersistFailed(_) => "persist_failed",
            FailureReason::InvalidDocument(_) => "invalid_document",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::LookupNotFound => write!(f, "catalog has no season count"),
            FailureReason::LookupFailed(msg) => write!(f, "catalog lookup failed: {}", msg),
            FailureReason::PersistFailed(msg) => write!(f, "write failed: {}", msg),
            FailureReason::InvalidDocument(msg) => write!(f, "invalid document: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationDetail {
    pub item_id: String,
    pub title: String,
    pub outcome: MigrationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seasons: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub details: Vec<MigrationDetail>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MigrationResult {
    fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            total: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            details: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.updated + self.skipped + self.failed == self.total && self.details.len() == self.total
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &MigrationDetail> {
        self.details
            .iter()
            .filter(|d| d.outcome == MigrationOutcome::Failed)
    }

    fn record(&mut self, detail: MigrationDetail) {
        match detail.outcome {
            MigrationOutcome::Updated => self.updated += 1,
            MigrationOutcome::Skipped => self.skipped += 1,
            MigrationOutcome::Failed => self.failed += 1,
        }
        self.details.push(detail);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seasons: Option<u32>,
}

/// Reported to the progress callback after each item.
#[derive(Debug, Clone)]
pub struct MigrationProgress {
    /// 1-based position of the item just processed
    pub current: usize,
    pub total: usize,
    pub title: String,
    pub outcome: MigrationOutcome,
}

pub type ProgressCallback = Box<dyn Fn(&MigrationProgress) + Send + Sync>;

pub struct MigrationEngine {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<dyn CatalogLookup>,
    rate_limit: Duration,
    progress_interval: usize,
    on_progress: Option<ProgressCallback>,
}

impl MigrationEngine {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self {
            store,
            catalog,
            rate_limit: DEFAULT_RATE_LIMIT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            on_progress: None,
        }
    }

    pub fn from_config(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn CatalogLookup>,
        config: &MigrationConfig,
    ) -> Self {
        Self::new(store, catalog)
            .with_rate_limit(config.rate_limit_delay())
            .with_progress_interval(config.progress_interval)
    }

    pub fn with_rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit = delay;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&MigrationProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Run the reconciliation over every series item of `user_id`.
    ///
    /// Per-item problems end up in the result; only a failed enumeration is an error.
    #[instrument(skip(self), fields(catalog = self.catalog.catalog_name()))]
    pub async fn migrate_all_series(&self, user_id: &str) -> Result<MigrationResult, MigrationError> {
        let started_at = Utc::now();
        let documents = self
            .store
            .query(&user_series_filters(user_id))
            .await
            .map_err(|source| MigrationError::Enumeration {
                user_id: user_id.to_string(),
                source,
            })?;

        let total = documents.len();
        let mut result = MigrationResult::empty(started_at);
        result.total = total;
        if total == 0 {
            info!("No series to migrate for user {}", user_id);
            result.finished_at = Utc::now();
            return Ok(result);
        }

        let mut tracker = ProgressTracker::new(total, self.progress_interval);
        for (index, document) in documents.iter().enumerate() {
            let detail = self.migrate_item(document, &mut tracker).await;

            match &detail.reason {
                Some(reason) => tracker.record_failed_with_error(reason.category()),
                None if detail.outcome == MigrationOutcome::Updated => tracker.record_updated(),
                None => tracker.record_skipped(),
            }

            if let Some(callback) = &self.on_progress {
                callback(&MigrationProgress {
                    current: index + 1,
                    total,
                    title: detail.title.clone(),
                    outcome: detail.outcome,
                });
            }

            result.record(detail);
            tracker.log_progress(index + 1);
        }

        tracker.log_summary("Season migration");
        result.finished_at = Utc::now();
        Ok(result)
    }

    async fn migrate_item(&self, document: &StoredDocument, tracker: &mut ProgressTracker) -> MigrationDetail {
        let item = match SeriesItem::from_document(&document.id, &document.fields) {
            Ok(item) => item,
            Err(e) => {
                warn!("Skipping unreadable item {}: {}", document.id, e);
                let title = document
                    .fields
                    .get(fields::TITLE)
                    .and_then(Value::as_str)
                    .unwrap_or(document.id.as_str())
                    .to_string();
                return failed(&document.id, title, None, FailureReason::InvalidDocument(e.to_string()));
            }
        };

        let title = item.display_title().to_string();
        let state = &item.state;
        let needs_lookup = state.known_total_seasons().is_none();

        let total_seasons = match state.known_total_seasons() {
            Some(total) => total,
            None => {
                tracker.record_catalog_call();
                match self.lookup_seasons(&title).await {
                    Ok(total) => total,
                    Err(reason) => {
                        debug!("Lookup for '{}' failed: {}", title, reason);
                        self.pause().await;
                        return failed(&item.id, title, None, reason);
                    }
                }
            }
        };

        let needs_watched_seasons_update =
            state.watched && state.watched_seasons.len() != total_seasons as usize;

        let outcome = if needs_lookup || needs_watched_seasons_update {
            let mut patch = FieldPatch::new();
            patch.set(fields::TOTAL_SEASONS, total_seasons);
            if state.watched {
                let all_seasons: Vec<Value> = (1..=total_seasons).map(Value::from).collect();
                patch.set(fields::WATCHED_SEASONS, Value::Array(all_seasons));
            }

            match self.store.update(&item.id, &patch).await {
                Ok(()) => {
                    debug!("Updated '{}' ({} seasons)", title, total_seasons);
                    Ok(MigrationOutcome::Updated)
                }
                Err(e) => {
                    warn!("Failed to save '{}': {}", title, e);
                    Err(FailureReason::PersistFailed(e.to_string()))
                }
            }
        } else {
            debug!("'{}' already up to date", title);
            Ok(MigrationOutcome::Skipped)
        };

        if needs_lookup {
            self.pause().await;
        }

        match outcome {
            Ok(outcome) => MigrationDetail {
                item_id: item.id.clone(),
                title,
                outcome,
                total_seasons: Some(total_seasons),
                reason: None,
            },
            Err(reason) => failed(&item.id, title, Some(total_seasons), reason),
        }
    }

    /// Look up one series and store its season count, leaving `watchedSeasons` alone.
    #[instrument(skip(self))]
    pub async fn refresh_one_series(&self, item_id: &str, title: &str) -> RefreshResult {
        let total_seasons = match self.lookup_seasons(title).await {
            Ok(total) => total,
            Err(reason) => {
                warn!("Refresh of '{}' failed: {}", title, reason);
                return RefreshResult { success: false, total_seasons: None };
            }
        };

        let mut patch = FieldPatch::new();
        patch.set(fields::TOTAL_SEASONS, total_seasons);
        match self.store.update(item_id, &patch).await {
            Ok(()) => {
                info!("Refreshed '{}': {} seasons", title, total_seasons);
                RefreshResult { success: true, total_seasons: Some(total_seasons) }
            }
            Err(e) => {
                warn!("Failed to save refreshed season count for '{}': {}", title, e);
                RefreshResult { success: false, total_seasons: None }
            }
        }
    }

    async fn lookup_seasons(&self, title: &str) -> Result<u32, FailureReason> {
        match self.catalog.lookup(title, MediaKind::Series).await {
            Ok(entry) => entry.total_seasons.ok_or(FailureReason::LookupNotFound),
            Err(e) if e.is_not_found() => Err(FailureReason::LookupNotFound),
            Err(e) => Err(FailureReason::LookupFailed(e.to_string())),
        }
    }

    async fn pause(&self) {
        if !self.rate_limit.is_zero() {
            tokio::time::sleep(self.rate_limit).await;
        }
    }
}

fn failed(item_id: &str, title: String, total_seasons: Option<u32>, reason: FailureReason) -> MigrationDetail {
    MigrationDetail {
        item_id: item_id.to_string(),
        title,
        outcome: MigrationOutcome::Failed,
        total_seasons,
        reason: Some(reason),
    }
}
