//! sourcepane: a feed reader's source pane in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  TaskMsg   ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tasks)  │  (channel) │ (wiring) │          │ (render) │
//! └──────────┘            └──────────┘          └──────────┘
//!       │                      ▲   │ dispatch / actions
//!       │ actions::sync        │   ▼
//!       └───────────────► SourceStore (library)
//!                              ▲
//!                              │ handle_key_event()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`config`**: command-line arguments.
//! * **`poll`**: spawns routines as tokio tasks and runs the sync timer.
//! * **`app`**: UI-side state (scroll position, status) and key actions.
//! * **`ui`**: pure rendering of the derived source view.
//! * **`input`**: maps key events to `App` methods.
//! * **`main`**: wires everything together: parse args, set up logging and
//!   the terminal, and run the event loop.

mod app;
mod config;
mod input;
mod poll;
mod ui;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use sourcepane::channel::{HttpFetcher, RssChannel};
use sourcepane::{SourceChannel, SourceStore};
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Args;

// ---------------------------------------------------------------------------
// Terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen. When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before printing a panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Log to `path` if given. The terminal belongs to the UI, so there is no
/// stdout fallback.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    install_panic_hook();

    info!(feeds = args.feeds.len(), mode = %args.mode, "starting");

    // -- wire the core -------------------------------------------------------
    let store = Arc::new(SourceStore::new());
    let channel: Arc<dyn SourceChannel> =
        Arc::new(RssChannel::new(HttpFetcher::new(), args.feeds.iter().cloned()));
    let (mode_tx, mode_rx) = watch::channel(args.mode);
    let (task_tx, mut task_rx) = mpsc::unbounded_channel();

    // -- start background sync -----------------------------------------------
    let poller = poll::spawn(
        Arc::clone(&store),
        Arc::clone(&channel),
        mode_rx,
        args.sync_interval(),
        task_tx.clone(),
    );

    // -- terminal setup (Drop restores on exit or panic) --------------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(store, channel, mode_tx, task_tx);
    app.load();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick). Each iteration:
    //   1. Drain routine reports.
    //   2. Render the UI.
    //   3. Poll for keyboard input (up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = task_rx.try_recv() {
            app.handle_task(msg);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // crossterm's poll blocks; keep it off the runtime's worker threads.
        let key = tokio::task::block_in_place(|| -> Result<Option<Event>> {
            if event::poll(tick_rate)? {
                Ok(Some(event::read()?))
            } else {
                Ok(None)
            }
        })?;

        if let Some(Event::Key(key)) = key {
            input::handle_key_event(&mut app, key);
        }

        if app.quit {
            break;
        }
    }

    poller.abort();
    info!("exiting");
    Ok(())
}
