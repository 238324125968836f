use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use crate::record::{Patch, Record};
use crate::source::{Change, DataSource};

const CHANGE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Remove,
}

/// Process-local data source seeded with fixture rows.
///
/// Ids of created records are `<prefix>-<n>`, continuing after the seed.
pub struct InMemorySource<R: Record> {
    prefix: &'static str,
    rows: Mutex<Vec<R>>,
    next_id: AtomicUsize,
    latency: Duration,
    failures: Mutex<HashMap<Operation, VecDeque<String>>>,
    changes: broadcast::Sender<Change>,
}

impl<R: Record> InMemorySource<R> {
    pub fn new(prefix: &'static str, seed: Vec<R>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            prefix,
            next_id: AtomicUsize::new(seed.len() + 1),
            rows: Mutex::new(seed),
            latency: Duration::ZERO,
            failures: Mutex::new(HashMap::new()),
            changes,
        }
    }

    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next call of `operation` fail with `message`.
    ///
    /// Calls queue up, so scripting two failures fails the next two calls.
    #[cfg(test)]
    pub async fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.failures
            .lock()
            .await
            .entry(operation)
            .or_default()
            .push_back(message.into());
    }

    /// Insert or replace a record as if another client had written it.
    #[cfg(test)]
    pub async fn push_external(&self, record: R) {
        let id = record.id().to_string();
        let change = {
            let mut rows = self.rows.lock().await;
            match rows.iter_mut().find(|r| r.id() == id) {
                Some(existing) => {
                    *existing = record;
                    Change::Updated(id)
                }
                None => {
                    rows.push(record);
                    Change::Created(id)
                }
            }
        };
        debug!("External change: {change:?}");
        self.notify(change);
    }

    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.rows.lock().await.len()
    }

    async fn simulate(&self, operation: Operation) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let scripted = self
            .failures
            .lock()
            .await
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(message) => {
                warn!("Scripted {operation:?} failure: {message}");
                Err(eyre!(message))
            }
            None => Ok(()),
        }
    }

    fn notify(&self, change: Change) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl<R: Record> DataSource<R> for InMemorySource<R> {
    async fn fetch(&self) -> Result<Vec<R>> {
        self.simulate(Operation::Fetch).await?;
        Ok(self.rows.lock().await.clone())
    }

    async fn create(&self, patch: Patch<R::Field>) -> Result<R> {
        self.simulate(Operation::Create).await?;
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = R::from_patch(format!("{}-{n}", self.prefix), &patch)?;
        self.rows.lock().await.push(record.clone());

        debug!("Created {}", record.id());
        self.notify(Change::Created(record.id().to_string()));
        Ok(record)
    }

    async fn update(&self, id: &str, patch: Patch<R::Field>) -> Result<R> {
        self.simulate(Operation::Update).await?;
        let updated = {
            let mut rows = self.rows.lock().await;
            let record = rows
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| eyre!("Record '{id}' not found"))?;
            record.apply(&patch)?;
            record.clone()
        };

        debug!("Updated {id}");
        self.notify(Change::Updated(id.to_string()));
        Ok(updated)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.simulate(Operation::Remove).await?;
        {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|r| r.id() != id);
            if rows.len() == before {
                return Err(eyre!("Record '{id}' not found"));
            }
        }

        debug!("Removed {id}");
        self.notify(Change::Removed(id.to_string()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}
