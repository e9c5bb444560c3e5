//! Async event loop for the TUI. Interleaves crossterm input, finished
//! backend tasks, and the spinner timer.

use std::future::Future;
use std::time::Duration;

use client::{ApiClient, ConfigController};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::action::{Action, Command};
use super::app::TuiApp;

/// RAII guard that restores the terminal on drop (even on panic).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Handles needed to run [`Command`]s.
struct Executor {
    controller: ConfigController,
    /// Carries the controller as its resync handler.
    chat_api: ApiClient,
    tx: mpsc::Sender<Action>,
}

impl Executor {
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Action> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = task.await;
            if tx.send(action).await.is_err() {
                debug!("TUI closed before task finished");
            }
        });
    }

    fn run(&self, command: Command) {
        let ctl = self.controller.clone();
        match command {
            Command::None => {}
            Command::Refresh => self.spawn(async move { Action::Refreshed(ctl.refresh().await) }),
            Command::LoadProviders => {
                self.spawn(async move { Action::ProvidersLoaded(ctl.api().providers().await) })
            }
            Command::LoadModels(provider) => self.spawn(async move {
                let result = ctl.api().models(&provider).await;
                Action::ModelsLoaded { provider, result }
            }),
            Command::AddModel(model) => self.spawn(async move {
                let result = ctl.api().add_model(&model).await.map(|_| ());
                Action::ModelAdded {
                    provider: model.provider,
                    result,
                }
            }),
            Command::Setup(request) => {
                self.spawn(async move { Action::SetupFinished(ctl.setup(request).await) })
            }
            Command::SaveSettings(request) => {
                self.spawn(async move { Action::SettingsSaved(ctl.update_config(request).await) })
            }
            Command::Reset => self.spawn(async move { Action::ResetFinished(ctl.reset().await) }),
            Command::SendChat(request) => {
                let api = self.chat_api.clone();
                self.spawn(async move { Action::ChatReplied(api.chat(&request).await) })
            }
        }
    }
}

/// Run the full-screen TUI until the user quits.
pub async fn run_tui(
    controller: ConfigController,
    chat_api: ApiClient,
    tick: Duration,
) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard; // Drop restores terminal

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    debug!(backend = %controller.api().base_url(), "TUI started");

    let (tx, mut rx) = mpsc::channel::<Action>(32);
    let executor = Executor {
        controller,
        chat_api,
        tx,
    };
    let mut app = TuiApp::new(executor.controller.api().base_url());

    // Boot fetch
    executor.run(Command::Refresh);

    let mut crossterm_stream = EventStream::new();
    let mut spinner_interval = tokio::time::interval(tick);
    spinner_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let command = app.observe(executor.controller.phase(), executor.controller.state());
        executor.run(command);

        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = crossterm_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        let command = app.handle_key(key);
                        executor.run(command);
                    }
                    // Resize and other events only need a redraw.
                    Some(Ok(_)) => {}
                    Some(Err(err)) => warn!(error = %err, "Terminal event error"),
                    None => break,
                }
            }

            Some(action) = rx.recv() => {
                let command = app.apply(action);
                executor.run(command);
            }

            _ = spinner_interval.tick(), if app.is_busy() => {
                app.tick();
            }
        }

        if app.should_quit {
            break;
        }
    }

    debug!(messages = app.transcript.len(), "TUI closed");
    // TerminalGuard::drop handles cleanup
    Ok(())
}
