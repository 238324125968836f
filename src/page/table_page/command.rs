//! Commands for table page operations.
//!
//! These commands call the page's data source and send results back
//! through the page's message channel. Once the page is torn down they
//! stop reporting.

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::Result;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::app::AppMessage;
use crate::commands::Command;
use crate::editor::Submission;
use crate::page::table_page::message::{SaveOrigin, TablePageMsg};
use crate::record::Record;
use crate::source::{Change, DataSource};
use crate::ui::ToastType;

/// The page's message channel, muted once the page is gone.
pub struct Outbox<R: Record> {
    tx: UnboundedSender<TablePageMsg<R>>,
    cancel: CancellationToken,
}

impl<R: Record> Clone for Outbox<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<R: Record> Outbox<R> {
    pub const fn new(tx: UnboundedSender<TablePageMsg<R>>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Deliver `msg` unless the page was torn down. Returns whether it was sent.
    pub fn send(&self, msg: TablePageMsg<R>) -> bool {
        if self.cancel.is_cancelled() {
            debug!("Page closed, dropping {msg:?}");
            return false;
        }
        self.tx.send(msg).is_ok()
    }

    fn cancelled(&self) -> &CancellationToken {
        &self.cancel
    }
}

fn toast(action_tx: &UnboundedSender<AppMessage>, message: String, toast_type: ToastType) -> Result<()> {
    action_tx.send(AppMessage::ShowToast {
        message,
        toast_type,
    })?;
    Ok(())
}

/// Load every row of the page.
pub struct FetchRowsCmd<R: Record> {
    title: &'static str,
    seq: u64,
    source: Arc<dyn DataSource<R>>,
    outbox: Outbox<R>,
}

impl<R: Record> FetchRowsCmd<R> {
    pub fn new(title: &'static str, seq: u64, source: Arc<dyn DataSource<R>>, outbox: Outbox<R>) -> Self {
        Self {
            title,
            seq,
            source,
            outbox,
        }
    }
}

#[async_trait]
impl<R: Record> Command for FetchRowsCmd<R> {
    fn name(&self) -> String {
        format!("Loading {} (#{})", self.title, self.seq)
    }

    async fn execute(self: Box<Self>, _action_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let seq = self.seq;
        match self.source.fetch().await {
            Ok(rows) => {
                self.outbox.send(TablePageMsg::Loaded { seq, rows });
            }
            Err(e) => {
                warn!("Loading {} failed: {e}", self.title);
                self.outbox.send(TablePageMsg::LoadFailed {
                    seq,
                    message: e.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Create or update a record.
pub struct SaveRecordCmd<R: Record> {
    noun: &'static str,
    origin: SaveOrigin,
    submission: Submission<R::Field>,
    source: Arc<dyn DataSource<R>>,
    outbox: Outbox<R>,
}

impl<R: Record> SaveRecordCmd<R> {
    pub fn new(
        noun: &'static str,
        origin: SaveOrigin,
        submission: Submission<R::Field>,
        source: Arc<dyn DataSource<R>>,
        outbox: Outbox<R>,
    ) -> Self {
        Self {
            noun,
            origin,
            submission,
            source,
            outbox,
        }
    }
}

#[async_trait]
impl<R: Record> Command for SaveRecordCmd<R> {
    fn name(&self) -> String {
        match &self.submission {
            Submission::Create(_) => format!("Creating {}", self.noun),
            Submission::Update { id, .. } => format!("Updating {} {id}", self.noun),
        }
    }

    async fn execute(self: Box<Self>, action_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let Self {
            noun,
            origin,
            submission,
            source,
            outbox,
        } = *self;

        let created = matches!(submission, Submission::Create(_));
        let result = match submission {
            Submission::Create(patch) => source.create(patch).await,
            Submission::Update { id, patch } => source.update(&id, patch).await,
        };

        match result {
            Ok(record) => {
                let message = match origin {
                    SaveOrigin::Action(label) => format!("{label}: {noun} {}", record.id()),
                    SaveOrigin::Editor(_) if created => format!("{noun} {} created", record.id()),
                    SaveOrigin::Editor(_) => format!("{noun} {} saved", record.id()),
                };
                if outbox.send(TablePageMsg::Saved { origin, record }) {
                    toast(&action_tx, message, ToastType::Success)?;
                }
            }
            Err(e) => {
                warn!("Saving {noun} failed: {e}");
                let sent = outbox.send(TablePageMsg::SaveFailed {
                    origin,
                    message: e.to_string(),
                });
                // The editor shows its own failures
                if sent && let SaveOrigin::Action(label) = origin {
                    toast(&action_tx, format!("{label} failed: {e}"), ToastType::Error)?;
                }
            }
        }
        Ok(())
    }
}

/// Remove a record.
pub struct DeleteRecordCmd<R: Record> {
    noun: &'static str,
    id: String,
    source: Arc<dyn DataSource<R>>,
    outbox: Outbox<R>,
}

impl<R: Record> DeleteRecordCmd<R> {
    pub fn new(noun: &'static str, id: String, source: Arc<dyn DataSource<R>>, outbox: Outbox<R>) -> Self {
        Self {
            noun,
            id,
            source,
            outbox,
        }
    }
}

#[async_trait]
impl<R: Record> Command for DeleteRecordCmd<R> {
    fn name(&self) -> String {
        format!("Deleting {} {}", self.noun, self.id)
    }

    async fn execute(self: Box<Self>, action_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let Self {
            noun,
            id,
            source,
            outbox,
        } = *self;

        match source.remove(&id).await {
            Ok(()) => {
                let message = format!("{noun} {id} deleted");
                if outbox.send(TablePageMsg::Deleted { id }) {
                    toast(&action_tx, message, ToastType::Success)?;
                }
            }
            Err(e) => {
                warn!("Deleting {noun} {id} failed: {e}");
                let message = format!("Failed to delete {noun} {id}: {e}");
                if outbox.send(TablePageMsg::DeleteFailed { id }) {
                    toast(&action_tx, message, ToastType::Error)?;
                }
            }
        }
        Ok(())
    }
}

/// Forward change notifications of the data source until the page closes.
pub struct WatchChangesCmd<R: Record> {
    title: &'static str,
    changes: Receiver<Change>,
    outbox: Outbox<R>,
}

impl<R: Record> WatchChangesCmd<R> {
    pub const fn new(title: &'static str, changes: Receiver<Change>, outbox: Outbox<R>) -> Self {
        Self {
            title,
            changes,
            outbox,
        }
    }
}

#[async_trait]
impl<R: Record> Command for WatchChangesCmd<R> {
    fn name(&self) -> String {
        format!("Watching {}", self.title)
    }

    async fn execute(self: Box<Self>, action_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let Self {
            title,
            mut changes,
            outbox,
        } = *self;
        let cancel = outbox.cancelled().clone();

        loop {
            let change = tokio::select! {
                () = cancel.cancelled() => break,
                change = changes.recv() => change,
            };
            match change {
                Ok(change) => debug!("{title} record {} changed", change.id()),
                // The missed changes are unknown, so the refetch below covers them.
                Err(RecvError::Lagged(missed)) => warn!("{title} missed {missed} changes, refetching"),
                Err(RecvError::Closed) => break,
            }
            if !outbox.send(TablePageMsg::Invalidated) {
                break;
            }
            action_tx.send(AppMessage::PageChanged)?;
        }

        debug!("Stopped watching {title}");
        Ok(())
    }
}
