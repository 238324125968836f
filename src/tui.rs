//! Terminal wrapper.
//!
//! [`Tui`] owns the ratatui terminal, switches raw mode and the alternate
//! screen on and off, and turns crossterm input plus two timers into a
//! single stream of [`Event`]s.

use std::io::Stdout;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::cursor;
use crossterm::event::{
    Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use futures::{FutureExt, StreamExt};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

const GRACEFUL_SHUTDOWN_TIMEOUT_MS: u64 = 500;
const FORCEFUL_SHUTDOWN_TIMEOUT_MS: u64 = 2000;

pub type Backend = CrosstermBackend<Stdout>;

#[derive(Clone, Debug)]
pub enum Event {
    Init,
    Quit,
    Error(String),
    Tick,
    Render,
    Key(KeyEvent),
    Resize(u16, u16),
}

pub struct Tui {
    terminal: Terminal<Backend>,
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
    event_rx: UnboundedReceiver<Event>,
    event_tx: UnboundedSender<Event>,
    frame_rate: f64,
    tick_rate: f64,
}

impl Tui {
    /// `frame_rate` and `tick_rate` are per second.
    pub fn new(frame_rate: f64, tick_rate: f64) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal: Terminal::new(Backend::new(std::io::stdout()))?,
            task: tokio::spawn(async {}),
            cancellation_token: CancellationToken::new(),
            event_rx,
            event_tx,
            frame_rate,
            tick_rate,
        })
    }

    /// Enter raw mode and the alternate screen, then start producing events.
    pub fn enter(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        self.start();
        Ok(())
    }

    /// Stop the event task and restore the terminal.
    pub fn exit(&mut self) -> Result<()> {
        self.stop()?;
        if crossterm::terminal::is_raw_mode_enabled()? {
            self.flush()?;
            crossterm::execute!(std::io::stdout(), LeaveAlternateScreen, cursor::Show)?;
            crossterm::terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    /// Restore the terminal and stop the process (Ctrl+Z).
    pub fn suspend(&mut self) -> Result<()> {
        self.exit()?;
        #[cfg(not(windows))]
        signal_hook::low_level::raise(signal_hook::consts::SIGTSTP)?;
        Ok(())
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    fn start(&mut self) {
        self.cancellation_token.cancel();
        self.cancellation_token = CancellationToken::new();
        let event_loop = Self::event_loop(
            self.event_tx.clone(),
            self.cancellation_token.clone(),
            self.tick_rate,
            self.frame_rate,
        );
        self.task = tokio::spawn(event_loop);
    }

    fn stop(&self) -> Result<()> {
        self.cancellation_token.cancel();
        let mut waited = 0;
        while !self.task.is_finished() {
            std::thread::sleep(Duration::from_millis(1));
            waited += 1;
            if waited >= GRACEFUL_SHUTDOWN_TIMEOUT_MS {
                self.task.abort();
            }
            if waited >= FORCEFUL_SHUTDOWN_TIMEOUT_MS {
                return Err(eyre!("Failed to stop the terminal event task"));
            }
        }
        Ok(())
    }

    fn translate(event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    Some(Event::Quit)
                } else {
                    Some(Event::Key(key))
                }
            }
            CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
            _ => None,
        }
    }

    async fn event_loop(
        event_tx: UnboundedSender<Event>,
        cancellation_token: CancellationToken,
        tick_rate: f64,
        frame_rate: f64,
    ) {
        let mut event_stream = EventStream::new();
        let mut tick_interval = interval(Duration::from_secs_f64(1.0 / tick_rate));
        let mut frame_interval = interval(Duration::from_secs_f64(1.0 / frame_rate));

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    let quit_tx = event_tx.clone();
                    tokio::spawn(async move {
                        sigterm.recv().await;
                        let _ = quit_tx.send(Event::Quit);
                    });
                }
                Err(e) => warn!("Could not install SIGTERM handler: {e}"),
            }
        }

        if event_tx.send(Event::Init).is_err() {
            return;
        }

        loop {
            let event = tokio::select! {
                () = cancellation_token.cancelled() => break,
                _ = tick_interval.tick() => Event::Tick,
                _ = frame_interval.tick() => Event::Render,
                crossterm_event = event_stream.next().fuse() => match crossterm_event {
                    Some(Ok(event)) => match Self::translate(event) {
                        Some(event) => event,
                        None => continue,
                    },
                    Some(Err(e)) => Event::Error(e.to_string()),
                    None => break,
                },
            };
            if event_tx.send(event).is_err() {
                break;
            }
        }
        cancellation_token.cancel();
    }
}

impl Deref for Tui {
    type Target = Terminal<Backend>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for Tui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.exit() {
            error!("Failed to restore the terminal: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_ctrl_c_quits() {
        let event = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert!(matches!(Tui::translate(event), Some(Event::Quit)));
    }

    #[test]
    fn test_only_presses_are_forwarded() {
        let press = key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Press);
        assert!(matches!(Tui::translate(press), Some(Event::Key(_))));

        let release = key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert!(Tui::translate(release).is_none());
        assert!(Tui::translate(CrosstermEvent::FocusLost).is_none());
        assert!(matches!(
            Tui::translate(CrosstermEvent::Resize(80, 24)),
            Some(Event::Resize(80, 24))
        ));
    }
}
