//! Async commands pattern for side effects.
//!
//! Commands represent async operations that run outside the main event loop.
//! Pages return commands, and the App spawns them and tells the page when one
//! finished so it can process the results it queued.

mod export;

use async_trait::async_trait;
use color_eyre::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppMessage;

pub use export::ExportRowsCmd;

/// Async commands that perform side effects.
///
/// Commands are spawned by the App. They typically send results back to the
/// page via a channel, and may raise toasts through `action_tx`.
#[async_trait]
pub trait Command: Send + 'static {
    /// Human-readable name for logging.
    /// Include context like record ids.
    fn name(&self) -> String;

    /// Execute the command.
    async fn execute(self: Box<Self>, action_tx: UnboundedSender<AppMessage>) -> Result<()>;
}
