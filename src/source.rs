//! Data source adapter contract.
//!
//! Pages never talk to storage directly. They fetch and mutate records through
//! a [`DataSource`] and listen to its change signal to know when the cached
//! rows went stale.

mod memory;

use async_trait::async_trait;
use color_eyre::Result;
use tokio::sync::broadcast;

use crate::record::{Patch, Record};

pub use memory::InMemorySource;
#[cfg(test)]
pub use memory::Operation;

/// Invalidation signal emitted after the underlying data changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created(String),
    Updated(String),
    Removed(String),
}

impl Change {
    pub fn id(&self) -> &str {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Removed(id) => id,
        }
    }
}

/// Async, fallible access to one collection of records.
#[async_trait]
pub trait DataSource<R: Record>: Send + Sync {
    /// Load the full record set.
    async fn fetch(&self) -> Result<Vec<R>>;

    /// Create a record from a patch and return it with its new id.
    async fn create(&self, patch: Patch<R::Field>) -> Result<R>;

    async fn update(&self, id: &str, patch: Patch<R::Field>) -> Result<R>;

    async fn remove(&self, id: &str) -> Result<()>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<Change>;
}
