mod command;
mod message;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::eyre;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Theme;
use crate::browser::export::to_delimited;
use crate::browser::{ColumnDef, FilterDef, RowAction, RowCommand};
use crate::commands::{Command, ExportRowsCmd};
use crate::config::{BrowserConfig, DialogAction, GlobalAction, KeyResolver};
use crate::editor::dialog::{EditorDialog, EditorEvent};
use crate::editor::{FieldDef, Mode, Submission};
use crate::page::{Page, PageMsg};
use crate::record::Record;
use crate::source::DataSource;
use crate::ui::{
    Component, ConfirmDialog, ConfirmEvent, DataTable, EventResult, Keybinding, Result, TableEvent,
};

use command::{DeleteRecordCmd, FetchRowsCmd, Outbox, SaveRecordCmd, WatchChangesCmd};
pub use message::{SaveOrigin, TablePageMsg};

/// Everything a record type declares to be browsed and edited on its own page.
pub trait TableSchema: Record {
    /// Page key, also used to name exported files.
    const KEY: &'static str;
    /// Page title, e.g. "Appointments".
    const TITLE: &'static str;
    /// Singular noun for dialogs and toasts, e.g. "Appointment".
    const NOUN: &'static str;

    fn columns() -> Vec<ColumnDef<Self>>;

    fn filters() -> Vec<FilterDef<Self::Field>> {
        Vec::new()
    }

    fn fields() -> Vec<FieldDef<Self::Field>>;

    fn actions() -> Vec<RowAction<Self>> {
        vec![RowAction::edit(), RowAction::delete()]
    }
}

struct PendingDelete<R> {
    row: R,
    dialog: ConfirmDialog,
}

/// Browse, edit and delete the records of one data source.
pub struct TablePage<R: TableSchema> {
    source: Arc<dyn DataSource<R>>,
    columns: Vec<ColumnDef<R>>,
    table: DataTable<R>,
    editor: EditorDialog<R::Field>,
    confirm: Option<PendingDelete<R>>,
    /// Ids with a delete in flight.
    deleting: HashSet<String>,
    /// Sequence number of the newest fetch issued.
    fetch_seq: u64,
    export_dir: PathBuf,
    cancel: CancellationToken,
    resolver: Arc<KeyResolver>,
    msg_tx: UnboundedSender<TablePageMsg<R>>,
    msg_rx: UnboundedReceiver<TablePageMsg<R>>,
}

impl<R: TableSchema> TablePage<R> {
    pub fn new(source: Arc<dyn DataSource<R>>, resolver: Arc<KeyResolver>, config: &BrowserConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let columns = R::columns();
        let table = DataTable::new(R::TITLE, columns.clone(), resolver.clone())
            .with_filters(R::filters())
            .with_actions(R::actions())
            .with_page_size(config.page_size);

        Self {
            source,
            columns,
            table,
            editor: EditorDialog::new(R::NOUN, R::fields(), resolver.clone()),
            confirm: None,
            deleting: HashSet::new(),
            fetch_seq: 0,
            export_dir: config.export_dir(),
            cancel: CancellationToken::new(),
            resolver,
            msg_tx,
            msg_rx,
        }
    }

    #[cfg(test)]
    pub const fn table(&self) -> &DataTable<R> {
        &self.table
    }

    #[cfg(test)]
    pub const fn editor(&self) -> &EditorDialog<R::Field> {
        &self.editor
    }

    /// Queue a message to be processed by update().
    fn queue(&self, msg: TablePageMsg<R>) {
        let _ = self.msg_tx.send(msg);
    }

    fn outbox(&self) -> Outbox<R> {
        Outbox::new(self.msg_tx.clone(), self.cancel.clone())
    }

    fn fetch(&mut self) -> Box<dyn Command> {
        self.fetch_seq += 1;
        Box::new(FetchRowsCmd::new(
            R::TITLE,
            self.fetch_seq,
            self.source.clone(),
            self.outbox(),
        ))
    }

    /// Refetch, keeping the current rows on screen unless there are none to keep.
    fn reload(&mut self) -> PageMsg {
        if self.table.is_loading() || self.table.error().is_some() {
            self.table.set_loading();
        } else {
            self.table.set_refreshing();
        }
        PageMsg::Run(vec![self.fetch()])
    }

    fn confirm_delete(&mut self, row: R) {
        if self.deleting.contains(row.id()) {
            debug!("{} {} is already being deleted", R::NOUN, row.id());
            return;
        }
        let dialog = ConfirmDialog::new(
            format!("Delete {} {}? This cannot be undone.", R::NOUN, row.id()),
            self.resolver.clone(),
        )
        .with_title(format!("Delete {}", R::NOUN))
        .with_confirm_text("Delete")
        .danger();
        self.confirm = Some(PendingDelete { row, dialog });
    }

    fn handle_table_event(&mut self, event: TableEvent<R>) {
        match event {
            TableEvent::Refresh => self.queue(TablePageMsg::Reload),
            TableEvent::Add => {
                self.editor.open_create();
            }
            TableEvent::Export(rows) => self.queue(TablePageMsg::Export(rows)),
            TableEvent::Edit(row) => {
                self.editor.open_edit(&row);
            }
            TableEvent::Delete(row) => self.confirm_delete(row),
            TableEvent::Action {
                label,
                row,
                command,
            } => match command {
                RowCommand::Edit => {
                    self.editor.open_edit(&row);
                }
                RowCommand::Delete => self.confirm_delete(row),
                RowCommand::Update(patch) => self.queue(TablePageMsg::Save {
                    origin: SaveOrigin::Action(label),
                    submission: Submission::Update {
                        id: row.id().to_string(),
                        patch,
                    },
                }),
            },
        }
    }

    fn process_message(&mut self, msg: TablePageMsg<R>) -> Result<PageMsg> {
        Ok(match msg {
            TablePageMsg::Initialize => {
                self.table.set_loading();
                let watch = WatchChangesCmd::new(R::TITLE, self.source.subscribe(), self.outbox());
                PageMsg::Run(vec![self.fetch(), Box::new(watch)])
            }

            TablePageMsg::Reload | TablePageMsg::Invalidated => self.reload(),

            TablePageMsg::Close => PageMsg::Close,

            TablePageMsg::Loaded { seq, rows } => {
                if seq < self.fetch_seq {
                    debug!("Dropping stale fetch #{seq} of {}", R::TITLE);
                } else {
                    self.table.set_rows(Arc::from(rows));
                }
                PageMsg::Idle
            }

            TablePageMsg::LoadFailed { seq, message } => {
                if seq < self.fetch_seq {
                    debug!("Dropping stale fetch failure #{seq} of {}", R::TITLE);
                } else {
                    self.table.set_error(message);
                }
                PageMsg::Idle
            }

            TablePageMsg::Save { origin, submission } => SaveRecordCmd::new(
                R::NOUN,
                origin,
                submission,
                self.source.clone(),
                self.outbox(),
            )
            .into(),

            TablePageMsg::Saved { origin, record } => {
                if let SaveOrigin::Editor(session) = origin
                    && !self.editor.editor_mut().succeed(session)
                {
                    debug!("Saved {} {} from a closed editor", R::NOUN, record.id());
                }
                self.reload()
            }

            TablePageMsg::SaveFailed { origin, message } => {
                if let SaveOrigin::Editor(session) = origin
                    && !self.editor.editor_mut().fail(session, message)
                {
                    debug!("Ignoring failure of a closed editor session");
                }
                PageMsg::Idle
            }

            TablePageMsg::Delete(row) => {
                let id = row.id().to_string();
                if self.deleting.insert(id.clone()) {
                    DeleteRecordCmd::new(R::NOUN, id, self.source.clone(), self.outbox()).into()
                } else {
                    debug!("{} {id} is already being deleted", R::NOUN);
                    PageMsg::Idle
                }
            }

            TablePageMsg::Deleted { id } => {
                self.deleting.remove(&id);
                self.reload()
            }

            TablePageMsg::DeleteFailed { id } => {
                self.deleting.remove(&id);
                PageMsg::Idle
            }

            TablePageMsg::Export(rows) => {
                let refs: Vec<&R> = rows.iter().collect();
                let contents = to_delimited(&self.columns, &refs);
                ExportRowsCmd::new(R::KEY, contents, rows.len(), self.export_dir.clone()).into()
            }

            TablePageMsg::Failed(message) => return Err(eyre!(message)),
        })
    }
}

impl<R: TableSchema> Page for TablePage<R> {
    fn init(&mut self) {
        self.queue(TablePageMsg::Initialize);
    }

    fn destroy(&mut self) {
        debug!("Closing {}", R::TITLE);
        self.cancel.cancel();
    }

    fn handle_tick(&mut self) {
        self.table.handle_tick();
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()> {
        if let Some(pending) = &mut self.confirm {
            match pending.dialog.handle_key(key) {
                Ok(EventResult::Event(ConfirmEvent::Confirmed)) => {
                    let row = pending.row.clone();
                    self.confirm = None;
                    self.queue(TablePageMsg::Delete(row));
                }
                Ok(EventResult::Event(ConfirmEvent::Cancelled)) => self.confirm = None,
                Ok(_) => {}
                Err(e) => self.queue(TablePageMsg::Failed(e.to_string())),
            }
            // Modal: everything else stays here
            return EventResult::Consumed;
        }

        if self.editor.is_open() {
            match self.editor.handle_key(key) {
                Ok(EventResult::Event(EditorEvent::Submit {
                    session,
                    submission,
                })) => self.queue(TablePageMsg::Save {
                    origin: SaveOrigin::Editor(session),
                    submission,
                }),
                Ok(EventResult::Event(EditorEvent::Cancelled)) => {
                    debug!("Discarded {} draft", R::NOUN);
                }
                Ok(_) => {}
                Err(e) => self.queue(TablePageMsg::Failed(e.to_string())),
            }
            return EventResult::Consumed;
        }

        match self.table.handle_key(key) {
            Ok(EventResult::Event(event)) => {
                self.handle_table_event(event);
                EventResult::Consumed
            }
            Ok(EventResult::Consumed) => EventResult::Consumed,
            Ok(EventResult::Ignored) => {
                if self.resolver.matches_global(&key, GlobalAction::Back) {
                    self.queue(TablePageMsg::Close);
                    EventResult::Consumed
                } else {
                    EventResult::Ignored
                }
            }
            Err(e) => {
                self.queue(TablePageMsg::Failed(e.to_string()));
                EventResult::Consumed
            }
        }
    }

    fn update(&mut self) -> Result<PageMsg> {
        if self.cancel.is_cancelled() {
            while self.msg_rx.try_recv().is_ok() {}
            return Ok(PageMsg::Idle);
        }

        // Drain all pending messages
        let mut commands: Vec<Box<dyn Command>> = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            match self.process_message(msg)? {
                PageMsg::Idle => {}
                PageMsg::Run(cmds) => commands.extend(cmds),
                PageMsg::Close => return Ok(PageMsg::Close),
            }
        }

        Ok(if commands.is_empty() {
            PageMsg::Idle
        } else {
            PageMsg::Run(commands)
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.table.render(frame, area, theme);
        if self.editor.is_open() {
            self.editor.render(frame, area, theme);
        }
        if let Some(pending) = &mut self.confirm {
            pending.dialog.render(frame, area, theme);
        }
    }

    fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = vec![R::TITLE.to_string()];
        match self.editor.editor().mode() {
            Some(Mode::Create) => crumbs.push(format!("New {}", R::NOUN)),
            Some(Mode::Edit { id }) => crumbs.push(id.clone()),
            None => {}
        }
        crumbs
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        if self.confirm.is_some() {
            return vec![
                Keybinding::hint(r.display_dialog(DialogAction::Confirm), "Delete"),
                Keybinding::hint(r.display_dialog(DialogAction::Cancel), "Keep"),
            ];
        }
        if self.editor.is_open() {
            return self.editor.keybindings();
        }
        self.table.keybindings()
    }

    fn is_capturing_input(&self) -> bool {
        self.confirm.is_some() || self.editor.is_open() || self.table.is_capturing_input()
    }
}
