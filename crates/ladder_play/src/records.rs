//! Shared win/fail counters.
//!
//! Two flat maps keyed by level number as a string, each counting up from
//! zero. The [`Records`] cache always has a snapshot to show; store failures
//! degrade to a warning and never reach gameplay.

use async_trait::async_trait;
use derive_more::{Display, Error};
use ladder_engine::{Level, RecordEvent, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Counter snapshot as served by the counter service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Level number to wins.
    #[serde(default)]
    pub wins: BTreeMap<String, u64>,
    /// Level number to failures.
    #[serde(default)]
    pub failures: BTreeMap<String, u64>,
}

impl Scoreboard {
    /// Current count for `level` and `kind`; absent keys read as zero.
    pub fn count(&self, level: Level, kind: RecordKind) -> u64 {
        self.map(kind)
            .get(&level.number().to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Adds one to the counter named by `event`.
    pub fn bump(&mut self, event: RecordEvent) -> u64 {
        let counter = self
            .map_mut(event.kind)
            .entry(event.level.number().to_string())
            .or_insert(0);
        *counter += 1;
        *counter
    }

    /// One line per level: number, name, wins and failures.
    pub fn table(&self) -> String {
        Level::ALL
            .iter()
            .map(|&level| {
                format!(
                    "{:>2}. {:<10} wins {:>4}  fails {:>4}",
                    level.number(),
                    level,
                    self.count(level, RecordKind::Win),
                    self.count(level, RecordKind::Fail)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn map(&self, kind: RecordKind) -> &BTreeMap<String, u64> {
        match kind {
            RecordKind::Win => &self.wins,
            RecordKind::Fail => &self.failures,
        }
    }

    fn map_mut(&mut self, kind: RecordKind) -> &mut BTreeMap<String, u64> {
        match kind {
            RecordKind::Win => &mut self.wins,
            RecordKind::Fail => &mut self.failures,
        }
    }
}

/// Body of an increment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementRequest {
    /// Level number as a string.
    pub level: String,
    /// Which counter.
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

impl From<RecordEvent> for IncrementRequest {
    fn from(event: RecordEvent) -> Self {
        Self {
            level: event.level.number().to_string(),
            kind: event.kind,
        }
    }
}

/// Counter storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads every counter.
    async fn fetch(&self) -> Result<Scoreboard, RecordsError>;

    /// Increments one counter and returns the full updated mapping.
    async fn increment(&self, event: RecordEvent) -> Result<Scoreboard, RecordsError>;
}

/// Counter service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecordStore {
    /// Request timeout for counter calls.
    pub const TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a client for the service at `base_url`.
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, RecordsError> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| RecordsError::new(format!("Failed to build HTTP client: {}", e)))?;
        info!("Counter service configured");
        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Service base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read(&self, response: reqwest::Response) -> Result<Scoreboard, RecordsError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read counter response");
            RecordsError::new(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            warn!(status = %status, response = %text, "Counter service error");
            return Err(RecordsError::new(format!(
                "Counter service error {}: {}",
                status, text
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = ?e, response = %text, "Failed to parse counter response");
            RecordsError::new(format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch(&self) -> Result<Scoreboard, RecordsError> {
        debug!("Fetching counters");
        let response = self
            .client
            .get(format!("{}/api/records/get", self.base_url))
            .send()
            .await
            .map_err(|e| RecordsError::new(format!("Counter request failed: {}", e)))?;
        self.read(response).await
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn increment(&self, event: RecordEvent) -> Result<Scoreboard, RecordsError> {
        debug!("Incrementing counter");
        let response = self
            .client
            .post(format!("{}/api/records/increment", self.base_url))
            .json(&IncrementRequest::from(event))
            .send()
            .await
            .map_err(|e| RecordsError::new(format!("Counter request failed: {}", e)))?;
        self.read(response).await
    }
}

/// In-process counters for offline play and tests.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Scoreboard>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `scoreboard`.
    pub fn with_scoreboard(scoreboard: Scoreboard) -> Self {
        Self {
            inner: Arc::new(Mutex::new(scoreboard)),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch(&self) -> Result<Scoreboard, RecordsError> {
        Ok(self.inner.lock().await.clone())
    }

    async fn increment(&self, event: RecordEvent) -> Result<Scoreboard, RecordsError> {
        let mut board = self.inner.lock().await;
        board.bump(event);
        Ok(board.clone())
    }
}

/// Last known counters plus the store they come from.
pub struct Records {
    store: Box<dyn RecordStore>,
    snapshot: Scoreboard,
    available: bool,
}

impl std::fmt::Debug for Records {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records")
            .field("snapshot", &self.snapshot)
            .field("available", &self.available)
            .finish_non_exhaustive()
    }
}

impl Records {
    /// Wraps `store` with an empty snapshot.
    pub fn new(store: impl RecordStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            snapshot: Scoreboard::default(),
            available: true,
        }
    }

    /// Last known counters.
    pub fn snapshot(&self) -> &Scoreboard {
        &self.snapshot
    }

    /// False after the most recent store call failed.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Re-reads every counter, keeping the old snapshot on failure.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> &Scoreboard {
        let result = self.store.fetch().await;
        self.accept(result);
        &self.snapshot
    }

    /// Persists one counter increment, keeping the old snapshot on failure.
    #[instrument(skip(self))]
    pub async fn record(&mut self, event: RecordEvent) -> &Scoreboard {
        info!(level = %event.level, kind = %event.kind, "Recording result");
        let result = self.store.increment(event).await;
        self.accept(result);
        &self.snapshot
    }

    fn accept(&mut self, result: Result<Scoreboard, RecordsError>) {
        match result {
            Ok(board) => {
                self.snapshot = board;
                self.available = true;
            }
            Err(e) => {
                warn!(error = %e, "Persistence unavailable, keeping last counters");
                self.available = false;
            }
        }
    }
}

/// Counter store error.
#[derive(Debug, Clone, Display, Error)]
#[display("Records error: {} at {}:{}", message, file, line)]
pub struct RecordsError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RecordsError {
    /// Creates a new records error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
