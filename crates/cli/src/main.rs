use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use brisca_api::{GameApi, HttpApi};
use brisca_core::{decode_log, encode_log};
use brisca_remote::{RemoteConfig, DEFAULT_URL};
use brisca_session::{
    spawn_live, spawn_replay, spawn_replay_log, Command, SessionCommands, SessionConfig, SessionError, SessionHandle,
    SessionOutcome,
};
use brisca_store::PacingPolicy;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

mod render;

#[derive(Parser, Debug)]
#[command(name = "brisca", version, about = "Brisca terminal client")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Game server base url
    #[arg(long, env = "BRISCA_URL", global = true, default_value = DEFAULT_URL)]
    url: String,

    /// Session cookie sent with every request, e.g. "session=..."
    #[arg(long, env = "BRISCA_COOKIE", global = true)]
    cookie: Option<String>,

    /// Draw suits as emoji instead of letters
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    emoji: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join the current game. Type "p N" to play card N, "s" to swap the life card, "q" to leave.
    Play {
        /// Write the game's action log here when the session ends
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Watch a finished game again
    Replay {
        /// Game id (UUID)
        game_id: String,
        /// Skip the pacing delays
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,
    },
    /// Replay a log written by `play --record`, without a server
    ReplayFile {
        path: PathBuf,
    },
}

fn init_tracing() {
    let env = std::env::var("BRISCA_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("BRISCA_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            warn!(addr = %addr, "invalid BRISCA_METRICS_ADDR; expected host:port");
        }
    }
}

fn connect(cli: &Cli) -> Result<Arc<dyn GameApi>> {
    let timeout_ms = std::env::var("BRISCA_HTTP_TIMEOUT_MS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(2000);
    let cfg = RemoteConfig::new(&cli.url)?
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_cookie(cli.cookie.clone());
    Ok(Arc::new(HttpApi::new(&cfg)?))
}

/// Parse one stdin line. `None` for blank lines.
fn parse_command(line: &str) -> Option<Result<Command, String>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let cmd = match words.as_slice() {
        [] => return None,
        ["p" | "play", n] => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Command::PlayCard(n - 1)),
            _ => Err(format!("card number must be 1 or more, got {n:?}")),
        },
        ["s" | "swap"] => Ok(Command::SwapBottomCard),
        ["q" | "quit" | "leave"] => Ok(Command::Leave),
        _ => Err(format!("unknown command {:?}; try \"p N\", \"s\" or \"q\"", line.trim())),
    };
    Some(cmd)
}

/// Stdin lines, read on a plain thread.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn read_commands(commands: SessionCommands, mut lines: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = lines.recv().await {
        let cmd = match parse_command(&line) {
            None => continue,
            Some(Err(msg)) => {
                eprintln!("{msg}");
                continue;
            }
            Some(Ok(cmd)) => cmd,
        };
        match commands.send(cmd).await {
            Ok(()) => {}
            Err(SessionError::Closed) => break,
            Err(e) => eprintln!("{e}"),
        }
        if cmd == Command::Leave {
            break;
        }
    }
}

/// Print every change until the session stops. Ctrl-C leaves the game.
async fn follow(handle: SessionHandle, output: Output, emoji: bool) -> Result<SessionOutcome> {
    let mut rx = handle.subscribe_epoch();
    let commands = handle.commands();
    let mut last = String::new();
    loop {
        let snap = handle.current();
        let text = match output {
            Output::Human => render::status_line(&snap, emoji),
            Output::Json => serde_json::to_string(&*snap)?,
        };
        if text != last {
            println!("{text}");
            last = text;
        }
        if snap.finished {
            break;
        }
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Ctrl-C received; leaving game");
                if let Err(e) = commands.leave().await {
                    warn!(error = %e, "leave failed");
                }
            }
        }
    }
    handle.join().await.context("session ended abnormally")
}

fn print_result(out: &SessionOutcome, output: Output) -> Result<()> {
    match output {
        Output::Human => {
            println!();
            print!("{}", render::board(&out.snapshot.projections));
            println!("{}", render::summary(&out.snapshot.projections));
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(&*out.snapshot)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Play { record } => {
            let api = connect(&cli)?;
            info!(url = %cli.url, "joining game");
            let handle = spawn_live(api, SessionConfig::from_env());
            let stdin_task = tokio::spawn(read_commands(handle.commands(), stdin_lines()));
            let out = follow(handle, cli.output, cli.emoji).await?;
            stdin_task.abort();
            if let Some(path) = record {
                let body = serde_json::to_vec_pretty(&encode_log(&out.log))?;
                std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), actions = out.log.len(), "action log recorded");
            }
            print_result(&out, cli.output)?;
        }
        Commands::Replay { game_id, fast } => {
            let id = Uuid::parse_str(game_id).with_context(|| format!("{game_id:?} is not a game id"))?;
            let api = connect(&cli)?;
            let mut cfg = SessionConfig::from_env();
            if *fast {
                cfg = cfg.with_pacing(PacingPolicy::instant());
            }
            let handle = spawn_replay(api, id, cfg).await.with_context(|| format!("fetching replay of {id}"))?;
            let out = follow(handle, cli.output, cli.emoji).await?;
            print_result(&out, cli.output)?;
        }
        Commands::ReplayFile { path } => {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let actions = decode_log(&bytes).with_context(|| format!("decoding {}", path.display()))?;
            info!(path = %path.display(), actions = actions.len(), "replaying recorded log");
            let handle = spawn_replay_log(actions, SessionConfig::from_env().with_pacing(PacingPolicy::instant()));
            let out = handle.join().await.context("replay failed")?;
            print_result(&out, cli.output)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stdin_commands() {
        assert_eq!(parse_command("p 1"), Some(Ok(Command::PlayCard(0))));
        assert_eq!(parse_command("  play 3 "), Some(Ok(Command::PlayCard(2))));
        assert_eq!(parse_command("s"), Some(Ok(Command::SwapBottomCard)));
        assert_eq!(parse_command("q"), Some(Ok(Command::Leave)));
        assert_eq!(parse_command("   "), None);
        assert!(matches!(parse_command("p 0"), Some(Err(_))));
        assert!(matches!(parse_command("p x"), Some(Err(_))));
        assert!(matches!(parse_command("dance"), Some(Err(_))));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["brisca", "replay", "0d9b3f7e-6f0a-4a53-9a5e-1f0e2b1c3d4e", "--fast"]).unwrap();
        assert!(matches!(cli.command, Commands::Replay { fast: true, .. }));
        let cli = Cli::try_parse_from(["brisca", "-o", "json", "play", "--record", "game.json"]).unwrap();
        assert_eq!(cli.output, Output::Json);
        assert!(matches!(cli.command, Commands::Play { record: Some(_) }));
    }
}
