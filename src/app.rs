mod message;

use std::sync::Arc;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::Theme;
use crate::cli::Args;
use crate::commands::Command;
use crate::config::{self, AppConfig, BrowserConfig, GlobalAction, KeyResolver};
use crate::page::{Page, PageMsg, PageSelectorView};
use crate::registry::{PageId, PageRegistry};
use crate::theme::available_themes;
use crate::tui::{Event, Tui};
use crate::ui::{
    Component, ErrorDialog, ErrorDialogEvent, EventResult, HelpEvent, HelpView, Keybinding,
    KeybindingSection, Picker, PickerEvent, StatusBar, Toast, ToastManager,
};

pub use message::AppMessage;

const FRAME_RATE: f64 = 30.0;
const TICK_RATE: f64 = 4.0;
const STATUS_BAR_HEIGHT: u16 = 9;

enum Route {
    Selector(PageSelectorView),
    Page {
        id: PageId,
        description: &'static str,
        page: Box<dyn Page>,
    },
}

enum Overlay {
    Help(HelpView),
    Error(ErrorDialog),
    Theme(Picker),
}

pub struct App {
    registry: PageRegistry,
    browser: BrowserConfig,
    resolver: Arc<KeyResolver>,
    theme: Theme,
    theme_name: String,
    route: Route,
    overlay: Option<Overlay>,
    status_bar: StatusBar,
    toasts: ToastManager,
    /// Write the last page and theme back to the config file.
    persist: bool,
    should_quit: bool,
    should_suspend: bool,
    message_tx: UnboundedSender<AppMessage>,
    message_rx: UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(registry: PageRegistry, config: &AppConfig, resolver: Arc<KeyResolver>, theme: Theme) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        Self {
            route: Route::Selector(PageSelectorView::new(&registry, resolver.clone())),
            registry,
            browser: config.browser.clone(),
            status_bar: StatusBar::new(&config.theme.name, resolver.clone()),
            resolver,
            theme,
            theme_name: config.theme.name.clone(),
            overlay: None,
            toasts: ToastManager::new(),
            persist: true,
            should_quit: false,
            should_suspend: false,
            message_tx,
            message_rx,
        }
    }

    /// Apply command line overrides. An explicit `--page` must exist; a
    /// remembered last page that no longer does is skipped.
    pub fn apply_cli_args(&mut self, args: &Args, last_page: Option<&str>) -> Result<()> {
        if let Some(size) = args.page_size {
            self.browser.page_size = usize::from(size);
        }

        if let Some(key) = &args.page {
            let id = PageId::new(key.as_str());
            if self.registry.get(&id).is_none() {
                let known: Vec<&str> = self.registry.providers().iter().map(|p| p.key()).collect();
                return Err(eyre!("Unknown page '{key}'. Available: {}", known.join(", ")));
            }
            self.message_tx.send(AppMessage::SelectPage(id))?;
        } else if let Some(key) = last_page {
            let id = PageId::new(key);
            if self.registry.get(&id).is_some() {
                self.message_tx.send(AppMessage::SelectPage(id))?;
            } else {
                warn!("Last page '{key}' is no longer registered");
            }
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new(FRAME_RATE, TICK_RATE)?;
        tui.enter()?;

        loop {
            self.handle_events(&mut tui).await?;
            self.handle_messages(&mut tui)?;
            if self.should_suspend {
                tui.suspend()?;
                self.message_tx.send(AppMessage::Resume)?;
                self.message_tx.send(AppMessage::ClearScreen)?;
                tui.enter()?;
            } else if self.should_quit {
                break;
            }
        }

        if let Route::Page { page, .. } = &mut self.route {
            page.destroy();
        }
        tui.exit()?;
        Ok(())
    }

    async fn handle_events(&mut self, tui: &mut Tui) -> Result<()> {
        let Some(event) = tui.next_event().await else {
            return Ok(());
        };

        match event {
            Event::Quit => self.message_tx.send(AppMessage::Quit)?,
            Event::Tick => self.message_tx.send(AppMessage::Tick)?,
            Event::Render => self.message_tx.send(AppMessage::Render)?,
            Event::Resize(width, height) => self.message_tx.send(AppMessage::Resize(width, height))?,
            Event::Key(key) => self.handle_key(key)?,
            Event::Error(e) => warn!("Terminal event error: {e}"),
            Event::Init => debug!("Terminal ready"),
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if let Some(overlay) = &mut self.overlay {
            let mut picked = None;
            let close = match overlay {
                Overlay::Help(help) => matches!(help.handle_key(key)?, EventResult::Event(HelpEvent::Close)),
                Overlay::Error(dialog) => matches!(
                    dialog.handle_key(key)?,
                    EventResult::Event(ErrorDialogEvent::Dismissed)
                ),
                Overlay::Theme(picker) => match picker.handle_key(key)? {
                    EventResult::Event(PickerEvent::Picked(index)) => {
                        picked = Some(index);
                        true
                    }
                    EventResult::Event(PickerEvent::Cancelled) => true,
                    _ => false,
                },
            };
            if let Some(index) = picked {
                self.select_theme(index);
            }
            if close {
                self.message_tx.send(AppMessage::ClosePopup)?;
            }
            return Ok(());
        }

        let capturing = match &self.route {
            Route::Selector(selector) => selector.is_searching(),
            Route::Page { page, .. } => page.is_capturing_input(),
        };
        if !capturing && self.handle_global_key(&key)? {
            return Ok(());
        }

        match &mut self.route {
            Route::Selector(selector) => {
                if let EventResult::Event(id) = selector.handle_key(key)? {
                    self.message_tx.send(AppMessage::SelectPage(id))?;
                }
            }
            Route::Page { page, .. } => {
                if page.handle_key(key).is_consumed() {
                    self.update_page()?;
                }
            }
        }
        Ok(())
    }

    fn handle_global_key(&self, key: &KeyEvent) -> Result<bool> {
        let message = if self.resolver.matches_global(key, GlobalAction::Quit) {
            AppMessage::Quit
        } else if self.resolver.matches_global(key, GlobalAction::Help) {
            AppMessage::DisplayHelp
        } else if self.resolver.matches_global(key, GlobalAction::Theme) {
            AppMessage::DisplayThemeSelector
        } else if key.code == KeyCode::Char('z') && key.modifiers.contains(KeyModifiers::CONTROL) {
            AppMessage::Suspend
        } else {
            return Ok(false);
        };
        self.message_tx.send(message)?;
        Ok(true)
    }

    fn handle_messages(&mut self, tui: &mut Tui) -> Result<()> {
        while let Ok(message) = self.message_rx.try_recv() {
            match message {
                AppMessage::Render => {
                    tui.draw(|frame| self.draw(frame))?;
                }
                AppMessage::Resize(width, height) => {
                    tui.resize(Rect::new(0, 0, width, height))?;
                    tui.draw(|frame| self.draw(frame))?;
                }
                AppMessage::ClearScreen => tui.clear()?,
                other => self.dispatch(other)?,
            }
        }
        Ok(())
    }

    /// Apply one message that does not need the terminal.
    fn dispatch(&mut self, message: AppMessage) -> Result<()> {
        if !matches!(message, AppMessage::Tick) {
            debug!("Handling message: {message:?}");
        }

        match message {
            AppMessage::Tick => {
                self.toasts.handle_tick();
                if let Route::Page { page, .. } = &mut self.route {
                    page.handle_tick();
                }
            }
            AppMessage::Quit => self.should_quit = true,
            AppMessage::Suspend => self.should_suspend = true,
            AppMessage::Resume => self.should_suspend = false,
            AppMessage::DisplayError(message) => {
                self.overlay = Some(Overlay::Error(ErrorDialog::new(message, self.resolver.clone())));
            }
            AppMessage::DisplayHelp => {
                self.overlay = Some(Overlay::Help(HelpView::new(
                    self.help_sections(),
                    self.resolver.clone(),
                )));
            }
            AppMessage::DisplayThemeSelector => {
                let themes = available_themes();
                let current = themes.iter().position(|t| t.name == self.theme_name);
                let labels = themes.iter().map(|t| t.name.to_string()).collect();
                self.overlay = Some(Overlay::Theme(Picker::with_current(
                    "Theme",
                    labels,
                    current,
                    self.resolver.clone(),
                )));
            }
            AppMessage::ClosePopup => self.overlay = None,
            AppMessage::ShowToast {
                message,
                toast_type,
            } => self.toasts.show(Toast::new(message, toast_type)),
            AppMessage::CommandCompleted { name, success } => {
                if !success {
                    warn!("Command failed: {name}");
                }
                self.update_page()?;
            }
            AppMessage::PageChanged => self.update_page()?,
            AppMessage::SelectPage(id) => self.open_page(&id)?,
            AppMessage::GoBack => self.close_page(),
            AppMessage::Render | AppMessage::Resize(..) | AppMessage::ClearScreen => {}
        }
        Ok(())
    }

    fn open_page(&mut self, id: &PageId) -> Result<()> {
        let Some(provider) = self.registry.get(id) else {
            self.message_tx
                .send(AppMessage::DisplayError(format!("Page '{id}' is not available")))?;
            return Ok(());
        };

        self.close_page();
        info!("Opening page {id}");

        let mut page = provider.create_page(self.resolver.clone(), &self.browser);
        page.init();
        self.status_bar
            .set_active_page(provider.display_name(), provider.description());
        self.route = Route::Page {
            id: id.clone(),
            description: provider.description(),
            page,
        };

        if self.persist
            && let Err(e) = config::save_last_page(id.key())
        {
            warn!("Failed to remember last page: {e}");
        }
        self.update_page()
    }

    fn close_page(&mut self) {
        if let Route::Page { id, page, .. } = &mut self.route {
            info!("Closing page {id}");
            page.destroy();
            self.route = Route::Selector(PageSelectorView::new(&self.registry, self.resolver.clone()));
            self.status_bar.clear_page();
        }
    }

    /// Drain the open page's queue and act on the result.
    fn update_page(&mut self) -> Result<()> {
        let Route::Page { page, .. } = &mut self.route else {
            return Ok(());
        };

        match page.update() {
            Ok(PageMsg::Idle) => {}
            Ok(PageMsg::Run(commands)) => {
                for command in commands {
                    self.spawn(command);
                }
            }
            Ok(PageMsg::Close) => self.message_tx.send(AppMessage::GoBack)?,
            Err(e) => self.message_tx.send(AppMessage::DisplayError(e.to_string()))?,
        }
        Ok(())
    }

    fn spawn(&self, command: Box<dyn Command>) {
        let name = command.name();
        let tx = self.message_tx.clone();
        debug!("Running command: {name}");
        tokio::spawn(async move {
            let success = match command.execute(tx.clone()).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("{name} failed: {e}");
                    false
                }
            };
            let _ = tx.send(AppMessage::CommandCompleted { name, success });
        });
    }

    fn select_theme(&mut self, index: usize) {
        let Some(info) = available_themes().into_iter().nth(index) else {
            return;
        };
        info!("Switching theme to {}", info.name);
        self.theme = info.theme;
        self.theme_name = info.name.to_string();
        self.status_bar.set_theme_name(info.name);
        self.toasts.show(Toast::info(format!("Theme set to {}", info.name)));
        if self.persist
            && let Err(e) = config::save_theme(info.name)
        {
            warn!("Failed to save theme: {e}");
        }
    }

    fn local_keybindings(&self) -> (String, Vec<Keybinding>) {
        match &self.route {
            Route::Selector(selector) => ("Pages".to_string(), selector.keybindings()),
            Route::Page { page, .. } => (
                page.breadcrumbs().first().cloned().unwrap_or_default(),
                page.keybindings(),
            ),
        }
    }

    fn help_sections(&self) -> Vec<KeybindingSection> {
        let (title, keybindings) = self.local_keybindings();
        vec![
            KeybindingSection::new(title, keybindings),
            KeybindingSection::new("Global", self.status_bar.global_keybindings()),
        ]
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [main, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_BAR_HEIGHT)]).areas(area);

        let (_, keybindings) = self.local_keybindings();
        match &mut self.route {
            Route::Selector(selector) => selector.render(frame, main, &self.theme),
            Route::Page {
                description, page, ..
            } => {
                self.status_bar
                    .set_active_page(page.breadcrumbs().join(" › "), *description);
                page.render(frame, main, &self.theme);
            }
        }
        self.status_bar
            .render_with_keybindings(frame, status, &self.theme, &keybindings);

        match &mut self.overlay {
            Some(Overlay::Help(help)) => help.render(frame, area, &self.theme),
            Some(Overlay::Error(dialog)) => dialog.render(frame, area, &self.theme),
            Some(Overlay::Theme(picker)) => picker.render(frame, area, &self.theme),
            None => {}
        }
        self.toasts.render(frame, main, &self.theme);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::DataConfig;
    use crate::config::keybindings::KeybindingsConfig;
    use crate::pages;
    use crate::ui::ToastType;

    fn app() -> App {
        let mut registry = PageRegistry::new();
        pages::register_all(&mut registry, &DataConfig::default());
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        let mut app = App::new(registry, &AppConfig::default(), resolver, Theme::default());
        app.persist = false;
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    /// Let spawned commands run and apply every queued message.
    async fn settle(app: &mut App) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
            while let Ok(message) = app.message_rx.try_recv() {
                app.dispatch(message).unwrap();
            }
        }
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    fn open_key(app: &App) -> Option<&str> {
        match &app.route {
            Route::Page { id, .. } => Some(id.key()),
            Route::Selector(_) => None,
        }
    }

    #[tokio::test]
    async fn test_enter_opens_page_and_loads_rows() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        settle(&mut app).await;

        assert_eq!(open_key(&app), Some("appointments"));
        assert!(screen(&mut app).contains("Maria Gonzalez"));
    }

    #[tokio::test]
    async fn test_back_returns_to_selector() {
        let mut app = app();
        app.dispatch(AppMessage::SelectPage(PageId::new("staff"))).unwrap();
        settle(&mut app).await;
        assert_eq!(open_key(&app), Some("staff"));

        press(&mut app, KeyCode::Esc);
        settle(&mut app).await;
        assert_eq!(open_key(&app), None);
        assert!(screen(&mut app).contains("Lab Tests & Scans"));
    }

    #[tokio::test]
    async fn test_quit_and_help_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        settle(&mut app).await;
        assert!(matches!(app.overlay, Some(Overlay::Help(_))));

        // Overlay swallows the quit key and closes
        press(&mut app, KeyCode::Char('q'));
        settle(&mut app).await;
        assert!(app.overlay.is_none());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));
        settle(&mut app).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_search_keeps_global_keys_out() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('q'));
        settle(&mut app).await;
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_toast_is_rendered() {
        let mut app = app();
        app.message_tx
            .send(AppMessage::ShowToast {
                message: "Staff member stf-1 saved".into(),
                toast_type: ToastType::Success,
            })
            .unwrap();
        settle(&mut app).await;
        assert!(screen(&mut app).contains("stf-1 saved"));
    }

    #[tokio::test]
    async fn test_cli_page_must_exist() {
        let mut app = app();
        let args = Args {
            page: Some("billing".into()),
            ..Args::default()
        };
        let err = app.apply_cli_args(&args, None).unwrap_err();
        assert!(err.to_string().contains("Unknown page 'billing'"));

        // A stale remembered page is skipped quietly
        app.apply_cli_args(&Args::default(), Some("billing")).unwrap();
        settle(&mut app).await;
        assert_eq!(open_key(&app), None);
    }

    #[tokio::test]
    async fn test_cli_page_and_page_size() {
        let mut app = app();
        let args = Args {
            page: Some("lab-tests".into()),
            page_size: Some(3),
            list_pages: false,
        };
        app.apply_cli_args(&args, Some("staff")).unwrap();
        settle(&mut app).await;

        assert_eq!(open_key(&app), Some("lab-tests"));
        assert_eq!(app.browser.page_size, 3);
        assert!(screen(&mut app).contains("Page 1 of 3"));
    }

    #[tokio::test]
    async fn test_theme_picker_switches_theme() {
        let mut app = app();
        app.dispatch(AppMessage::DisplayThemeSelector).unwrap();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        settle(&mut app).await;

        assert!(app.overlay.is_none());
        assert_eq!(app.theme_name, "Catppuccin Macchiato");
    }
}
