pub mod config;
mod console;
pub mod driver;
pub mod feedback;
pub mod mood;
pub mod session;

use config::{AppConfig, ConfigError};
use console::ConsoleCommand;
use driver::{SessionHandle, SessionRunner};
use feedback::{Feedback, NoHaptics, TerminalBell};
use mood::{HttpMoodClient, MoodClient, MoodError, PostSessionMood, PostSessionOutcome};
use session::{SessionError, SessionEvent, SessionSnapshot};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Mood(#[from] MoodError),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("breathe_lib=info"));

    // Logs go to stderr so they never interleave with the status line.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Redraws the status line whenever the session publishes a snapshot.
fn start_render_loop(handle: &SessionHandle) -> JoinHandle<()> {
    let mut snapshots = handle.subscribe();
    let mut events = handle.events();

    tokio::spawn(async move {
        draw(&snapshots.borrow_and_update().clone());
        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    draw(&snapshot);
                }
                event = events.recv() => match event {
                    Ok(SessionEvent::Completed { rounds }) => {
                        println!(
                            "\nGreat job! You completed {} rounds. How are you feeling now?",
                            rounds
                        );
                        println!("Pick one with 'mood <name>', or 'again' / 'home'.");
                    }
                    Ok(SessionEvent::Closed { .. }) => break,
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Render loop skipped {} events", skipped);
                    }
                    Err(_) => break,
                },
            }
        }
    })
}

fn draw(snapshot: &SessionSnapshot) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "\r\x1b[2K{}", console::render_line(snapshot));
    let _ = stdout.flush();
}

struct App {
    config: AppConfig,
    config_path: PathBuf,
    handle: SessionHandle,
    mood_client: Arc<dyn MoodClient>,
    post_session: Option<PostSessionMood>,
}

impl App {
    fn post_session(&mut self) -> &mut PostSessionMood {
        let client = self.mood_client.clone();
        let config = &self.config;
        self.post_session.get_or_insert_with(|| {
            PostSessionMood::new(client, config.user_id.clone())
                .with_note(config.mood_note.clone())
                .with_return_delay(Duration::from_millis(config.return_delay_ms))
        })
    }

    /// Returns false when the app should exit.
    async fn dispatch(&mut self, command: ConsoleCommand) -> Result<bool, AppError> {
        match command {
            ConsoleCommand::Toggle => {
                if let Err(e) = self.handle.toggle().await {
                    println!("\n{}", e);
                }
            }
            ConsoleCommand::Reset => {
                self.handle.reset().await?;
            }
            ConsoleCommand::Settings { .. } | ConsoleCommand::Sound(_) | ConsoleCommand::Haptic(_) => {
                let Some(settings) = console::settings_for(command, self.handle.snapshot().settings())
                else {
                    return Ok(true);
                };
                match self.handle.apply_settings(settings).await {
                    Ok(_) => {
                        self.post_session = None;
                        match config::update_settings(&self.config_path, settings) {
                            Ok(updated) => self.config.settings = updated.settings,
                            Err(e) => tracing::warn!("Failed to persist settings: {}", e),
                        }
                    }
                    Err(e) => println!("\n{}", e),
                }
            }
            ConsoleCommand::Mood(mood) => {
                if !self.handle.snapshot().is_completed() {
                    println!("\nFinish the session before logging a mood.");
                    return Ok(true);
                }
                match self.post_session().select(mood).await {
                    Ok(PostSessionOutcome::ReturnHome { receipt }) => {
                        if let Some(receipt) = receipt {
                            println!("\nLogged {} (weighted mood {:.2})", mood, receipt.weighted_mood);
                        }
                        self.close().await?;
                        return Ok(false);
                    }
                    Ok(PostSessionOutcome::StartAgain) => {}
                    Err(e) => println!("\nCould not log mood: {}. Pick again.", e),
                }
            }
            ConsoleCommand::Again => {
                if let Some(flow) = self.post_session.take() {
                    let _ = flow.start_again();
                }
                self.handle.start_again().await?;
            }
            ConsoleCommand::Home => {
                if let Some(flow) = self.post_session.take() {
                    let _ = flow.return_home();
                }
                self.close().await?;
                return Ok(false);
            }
            ConsoleCommand::Latest => match self.mood_client.latest(&self.config.user_id).await {
                Ok(Some(receipt)) => println!(
                    "\nLast mood: {} at {} (weighted {:.2})",
                    receipt.emoji,
                    receipt.timestamp.as_deref().unwrap_or("unknown time"),
                    receipt.weighted_mood
                ),
                Ok(None) => println!("\nNo mood logged yet."),
                Err(e) => println!("\nCould not fetch latest mood: {}", e),
            },
            ConsoleCommand::ClearHistory => match config::clear_history(&self.config_path) {
                Ok(()) => println!("\nSession history cleared."),
                Err(e) => println!("\nCould not clear history: {}", e),
            },
            ConsoleCommand::Help => println!("\n{}", console::help_text()),
            ConsoleCommand::Quit => {
                self.close().await?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn close(&mut self) -> Result<(), AppError> {
        let summary = self.handle.complete_session().await?;
        if let Err(e) = config::record_session(&self.config_path, &summary) {
            tracing::warn!("Failed to record session history: {}", e);
        }
        println!();
        Ok(())
    }
}

async fn run_console() -> Result<(), AppError> {
    let config_path = config::config_path()?;
    let mut config = config::load_or_create(&config_path)?;
    config::apply_overrides(&mut config, |key| std::env::var(key).ok());

    let feedback = Feedback::none()
        .with_haptics(Arc::new(NoHaptics))
        .with_sound(Arc::new(TerminalBell));
    let handle = SessionRunner::spawn(config.settings, feedback)?;

    let mood_client: Arc<dyn MoodClient> = Arc::new(HttpMoodClient::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?);

    println!("{}", console::help_text());
    let render_task = start_render_loop(&handle);

    let mut app = App {
        config,
        config_path,
        handle,
        mood_client,
        post_session: None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break app.close().await,
            Err(e) => break Err(e.into()),
        };

        let command = match console::parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match app.dispatch(command).await {
            Ok(true) => {}
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    render_task.abort();
    result
}

pub fn run() {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();
    init_logging();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_console()) {
        tracing::error!("Breathing session ended with an error: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
