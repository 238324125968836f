use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use color_eyre::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::app::AppMessage;
use crate::commands::Command;
use crate::ui::ToastType;

/// Writes delimited text to `<dir>/<page>-<timestamp>.csv` and toasts the path.
pub struct ExportRowsCmd {
    page: String,
    contents: String,
    rows: usize,
    dir: PathBuf,
}

impl ExportRowsCmd {
    pub fn new(
        page: impl Into<String>,
        contents: impl Into<String>,
        rows: usize,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            page: page.into(),
            contents: contents.into(),
            rows,
            dir: dir.into(),
        }
    }

    fn file_name(&self, now: NaiveDateTime) -> String {
        format!("{}-{}.csv", self.page, now.format("%Y%m%d-%H%M%S"))
    }
}

#[async_trait]
impl Command for ExportRowsCmd {
    fn name(&self) -> String {
        format!("Exporting {} rows of {}", self.rows, self.page)
    }

    async fn execute(self: Box<Self>, action_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let path = self.dir.join(self.file_name(Local::now().naive_local()));

        let written = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, &self.contents).await
        }
        .await;

        let (message, toast_type) = match written {
            Ok(()) => {
                info!("Exported {} rows to {}", self.rows, path.display());
                (
                    format!("Exported {} rows to {}", self.rows, path.display()),
                    ToastType::Success,
                )
            }
            Err(e) => {
                warn!("Export to {} failed: {e}", path.display());
                (format!("Export failed: {e}"), ToastType::Error)
            }
        };
        action_tx.send(AppMessage::ShowToast {
            message,
            toast_type,
        })?;
        Ok(())
    }
}
