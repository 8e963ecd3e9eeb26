// # hostreg - Host Registry Console
//
// A thin console front-end over `hostreg-core`. It reads commands from stdin,
// turns them into engine intents and prints the cached hosts and every
// notification the engine raises.
//
// All registry logic (validation, workflows, cache reconciliation) lives in
// hostreg-core; this binary only wires it to a terminal.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `HOSTREG_ENDPOINT`: API address to connect to at startup (optional;
//   without it the client asks for one)
// - `HOSTREG_API_PORT`: API port (default 8080)
// - `HOSTREG_HTTP_TIMEOUT_SECS`: Per-request timeout (default 30)
// - `HOSTREG_NOTIFY_CAPACITY`: Notification queue size (default 64)
// - `HOSTREG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export HOSTREG_ENDPOINT=192.168.1.2
// hostreg
// ```

mod commands;

use anyhow::{Context, Result};
use hostreg_core::{
    ClientConfig, HostRecord, Notification, NotificationKind, RegistryEngine, WorkflowState,
};
use hostreg_transport_http::HttpTransport;
use std::env;
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{LinesStream, ReceiverStream};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use commands::{Command, USAGE, parse_command};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum HostregExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HostregExitCode> for ExitCode {
    fn from(code: HostregExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    client: ClientConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from a variable lookup
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut client = ClientConfig::new();

        if let Some(address) = var("HOSTREG_ENDPOINT") {
            client.initial_endpoint = Some(address);
        }
        if let Some(port) = var("HOSTREG_API_PORT") {
            client.api_port = port
                .parse()
                .with_context(|| format!("HOSTREG_API_PORT is not a port number: {}", port))?;
        }
        if let Some(secs) = var("HOSTREG_HTTP_TIMEOUT_SECS") {
            client.http_timeout_secs = secs.parse().with_context(|| {
                format!("HOSTREG_HTTP_TIMEOUT_SECS is not a number: {}", secs)
            })?;
        }
        if let Some(capacity) = var("HOSTREG_NOTIFY_CAPACITY") {
            client.notification_channel_capacity = capacity.parse().with_context(|| {
                format!("HOSTREG_NOTIFY_CAPACITY is not a number: {}", capacity)
            })?;
        }

        Ok(Self {
            client,
            log_level: var("HOSTREG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.client.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "HOSTREG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Maximum level for the tracing subscriber
    fn max_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return HostregExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return HostregExitCode::ConfigError.into();
    }

    // Logs go to stderr so they never interleave with the host table
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.max_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HostregExitCode::ConfigError.into();
    }

    info!("Starting hostreg console");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HostregExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_console(config).await {
            error!("Console error: {:#}", e);
            HostregExitCode::RuntimeError
        } else {
            HostregExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the console until stdin closes, `quit`, or Ctrl-C
async fn run_console(config: Config) -> Result<()> {
    let transport = HttpTransport::from_config(&config.client)?;
    let (engine, notifications) = RegistryEngine::new(Box::new(transport), config.client)?;
    let mut notifications = ReceiverStream::new(notifications);

    // A failed initial connect is reported like any other failure
    if let Err(e) = engine.start().await {
        debug!("Initial connect failed: {}", e);
    }

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    print_pending(&mut notifications);
    render(&engine).await;

    loop {
        tokio::select! {
            line = lines.next() => {
                let line = match line {
                    Some(line) => line.context("Failed to read from stdin")?,
                    None => {
                        info!("stdin closed, exiting");
                        break;
                    }
                };

                match parse_command(&line, &engine.workflow_state()) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => println!("{}", USAGE),
                    Ok(Some(Command::Show)) => print_hosts(&engine.hosts().await),
                    Ok(Some(Command::Intent(intent))) => {
                        // Failures arrive as notifications
                        if let Err(e) = engine.dispatch(intent).await {
                            debug!("Intent failed: {}", e);
                        }
                    }
                    Err(usage) => println!("{}", usage),
                }

                print_pending(&mut notifications);
                render(&engine).await;
            }
            Some(notification) = notifications.next() => {
                print_notification(&notification);
            }
            result = &mut ctrl_c => {
                result.context("Failed to wait for Ctrl-C")?;
                info!("Received Ctrl-C, exiting");
                break;
            }
        }
    }

    Ok(())
}

/// Print every notification already queued
fn print_pending(notifications: &mut ReceiverStream<Notification>) {
    let rx: &mut tokio::sync::mpsc::Receiver<Notification> = notifications.as_mut();
    while let Ok(notification) = rx.try_recv() {
        print_notification(&notification);
    }
}

fn print_notification(notification: &Notification) {
    let tag = match notification.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Refreshed => "sync",
        NotificationKind::Failure => "error",
    };
    println!(
        "[{} {}] {}",
        notification.at.format("%H:%M:%S"),
        tag,
        notification.message
    );
    if notification.offer_reconfigure {
        println!("        Type 'endpoint' to change the API address.");
    }
}

/// Print the hosts after a sync or the active dialog, then the prompt
async fn render(engine: &RegistryEngine) {
    match engine.workflow_state() {
        WorkflowState::Idle => {
            print_hosts(&engine.hosts().await);
            print!("hostreg> ");
        }
        WorkflowState::SettingEndpoint => {
            print!("Enter the API IP address: ");
        }
        WorkflowState::ConfirmingDelete { target } => {
            print!(
                "Delete {} ({})? [confirm/cancel] ",
                target.hostname, target.mac
            );
        }
        WorkflowState::Editing { draft, .. } => {
            println!(
                "Editing {}: hostname={} ip={}",
                draft.mac,
                draft.hostname,
                draft.ip.as_deref().unwrap_or("-")
            );
            print!("[hostname <name> | ip [address] | save | cancel] ");
        }
    }

    // The prompt has no newline
    let _ = std::io::stdout().flush();
}

fn print_hosts(hosts: &[HostRecord]) {
    if hosts.is_empty() {
        println!("No hosts.");
        return;
    }

    println!("{:<17}  {:<24}  {}", "MAC", "HOSTNAME", "IP");
    for host in hosts {
        println!(
            "{:<17}  {:<24}  {}",
            host.mac,
            host.hostname,
            host.ip.as_deref().unwrap_or("-")
        );
    }
}
