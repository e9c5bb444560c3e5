//! CLI entrypoint and subcommand orchestration.

mod config;
#[cfg(test)]
mod test_support;
mod tui;

use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use client::{
    BlockReason, ChatSession, ConfigController, DISABLED_NOTICE, Phase, SendOutcome, SystemState,
};
use config::Config;
use proto::{ModelInfo, ProviderInfo, SetupRequest, UpdateRequest};
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::tui::{normalize_api_key, requires_api_key};

/// Top-level command-line arguments for pxchat.
#[derive(Parser)]
#[command(name = "pxchat")]
#[command(about = "Terminal client for a local LLM chat backend", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.pxchat/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the full-screen TUI (default when no subcommand is given)
    Tui,
    /// Print the backend's configuration and auth status
    Status,
    /// List providers offered by the backend
    Providers,
    /// List models for a provider
    Models {
        #[arg(short, long)]
        provider: String,
    },
    /// First-time configuration
    Setup {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        model: String,
        /// Required for groq, openai, huggingface and custom-openai
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Change the active model and/or API key, then re-verify
    Update {
        #[arg(short, long)]
        model: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Clear all backend configuration
    Reset,
    /// Send one message and print the reply
    Chat {
        #[arg(short = 'm', long)]
        message: String,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Self::Tui => "tui",
            Self::Status => "status",
            Self::Providers => "providers",
            Self::Models { .. } => "models",
            Self::Setup { .. } => "setup",
            Self::Update { .. } => "update",
            Self::Reset => "reset",
            Self::Chat { .. } => "chat",
        }
    }
}

#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    let is_tui = matches!(command, Commands::Tui);

    // Console output is suppressed in TUI mode so it cannot corrupt the display.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        let log_dir = Config::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from(".pxchat"))
            .join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (is_tui, debug_writer) {
        (true, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::sink)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new(
                    "debug,hyper_util=info,rustls=info,reqwest=info",
                ));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
        (false, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new(
                    "debug,hyper_util=info,rustls=info,reqwest=info",
                ));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    if cli.debug {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command.label(),
            log_level = %cli.log_level,
            "========== pxchat session start =========="
        );
    }

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let (controller, chat_api) = client::connect(config.backend.base_url.clone());

    match command {
        Commands::Tui => {
            tui::run_tui(
                controller,
                chat_api,
                Duration::from_millis(config.ui.tick_ms),
            )
            .await
        }
        Commands::Status => cmd_status(&controller).await,
        Commands::Providers => cmd_providers(&controller).await,
        Commands::Models { provider } => cmd_models(&controller, &provider).await,
        Commands::Setup {
            provider,
            model,
            api_key,
        } => cmd_setup(&controller, provider, model, api_key).await,
        Commands::Update { model, api_key } => cmd_update(&controller, model, api_key).await,
        Commands::Reset => cmd_reset(&controller).await,
        Commands::Chat { message } => {
            cmd_chat(ChatSession::new(chat_api, controller), &message).await
        }
    }
}

async fn cmd_status(controller: &ConfigController) -> anyhow::Result<()> {
    let phase = controller
        .refresh()
        .await
        .context("failed to fetch backend status")?;
    print_status(controller, phase);
    Ok(())
}

async fn cmd_providers(controller: &ConfigController) -> anyhow::Result<()> {
    let providers = controller
        .api()
        .providers()
        .await
        .context("failed to list providers")?;
    print!("{}", format_providers(&providers));
    Ok(())
}

async fn cmd_models(controller: &ConfigController, provider: &str) -> anyhow::Result<()> {
    let models = controller
        .api()
        .models(provider)
        .await
        .with_context(|| format!("failed to list models for '{provider}'"))?;
    print!("{}", format_models(provider, &models));
    Ok(())
}

async fn cmd_setup(
    controller: &ConfigController,
    provider: String,
    model: String,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let api_key = normalize_api_key(
        api_key.as_deref().unwrap_or_default(),
        requires_api_key(&provider),
    )?;
    let phase = controller
        .setup(SetupRequest {
            provider,
            model_id: model,
            api_key,
        })
        .await
        .context("setup failed")?;
    print_status(controller, phase);
    Ok(())
}

async fn cmd_update(
    controller: &ConfigController,
    model: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let request = UpdateRequest {
        model_id: model,
        api_key: normalize_api_key(api_key.as_deref().unwrap_or_default(), false)?,
    };
    if request.is_empty() {
        bail!("nothing to update: pass --model and/or --api-key");
    }
    let phase = controller
        .update_config(request)
        .await
        .context("update failed")?;
    print_status(controller, phase);
    if phase == Phase::ReadyLocked {
        eprintln!("warning: credentials were not accepted; chat is locked");
    }
    Ok(())
}

async fn cmd_reset(controller: &ConfigController) -> anyhow::Result<()> {
    controller.reset().await.context("reset failed")?;
    println!("Configuration cleared. Run `pxchat setup` to configure again.");
    Ok(())
}

async fn cmd_chat(mut session: ChatSession, message: &str) -> anyhow::Result<()> {
    session
        .controller()
        .refresh()
        .await
        .context("failed to fetch backend status")?;

    match session.send(message).await {
        SendOutcome::Replied => {
            if let Some(reply) = session.transcript().messages().last() {
                println!("{}", reply.content);
            }
            Ok(())
        }
        SendOutcome::Blocked(reason) => bail!(blocked_message(reason)),
        SendOutcome::Failed(err) => {
            println!("{DISABLED_NOTICE}");
            Err(anyhow::Error::new(err).context("chat request failed"))
        }
    }
}

fn blocked_message(reason: BlockReason) -> &'static str {
    match reason {
        BlockReason::EmptyMessage => "message is empty",
        BlockReason::Locked => {
            "chat is disabled: run `pxchat setup` or update the API key with `pxchat update --api-key`"
        }
        BlockReason::NoModel => "no model selected: run `pxchat update --model <id>`",
    }
}

fn print_status(controller: &ConfigController, phase: Phase) {
    let state = controller.state().unwrap_or_default();
    print!("{}", format_status(&state, phase));
}

/// Plain-text status report, one `key: value` per line.
fn format_status(state: &SystemState, phase: Phase) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let model = match (&state.display_name, &state.model) {
        (Some(name), Some(id)) if name != id => format!("{name} ({id})"),
        (_, Some(id)) => id.clone(),
        (Some(name), None) => name.clone(),
        (None, None) => "-".to_string(),
    };
    format!(
        "phase:      {phase}\n\
         configured: {}\n\
         provider:   {}\n\
         model:      {model}\n\
         auth:       {}\n\
         api key:    {}\n\
         chat:       {}\n",
        yes_no(state.configured),
        state.provider.as_deref().unwrap_or("-"),
        state.auth.as_str(),
        if state.api_key_present { "present" } else { "missing" },
        if state.chat_enabled() { "enabled" } else { "disabled" },
    )
}

fn format_providers(providers: &[ProviderInfo]) -> String {
    providers
        .iter()
        .map(|p| format!("{:<16} {}\n", p.id, p.name))
        .collect()
}

fn format_models(provider: &str, models: &[ModelInfo]) -> String {
    if models.is_empty() {
        return format!("No models registered for '{provider}'.\n");
    }
    models
        .iter()
        .map(|m| format!("{:<32} {}\n", m.id, m.name))
        .collect()
}
