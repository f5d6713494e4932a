use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use yocr_client::brand;
use yocr_client::config::{API_TIMEOUT_ENV, API_VERSION_ENV, BACKEND_URL_ENV, ClientConfig};
use yocr_client::theme::{FileStore, MemorySurface, ThemeController, ThemeMode};
use yocr_client::uploads::{self, SendOptions, SocketError, UploadCommand};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Socket(#[from] SocketError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("`--data` must be a JSON object")]
    DataNotObject,
}

#[derive(Parser, Debug)]
#[command(name = "yocr", about = "YOCR client toolkit: routes, uploads socket, theme")]
struct Cli {
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    #[arg(long, env = "API_VERSION")]
    api_version: Option<String>,

    #[arg(long, env = "API_TIMEOUT")]
    api_timeout: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved configuration and route table.
    Routes,
    /// Resolve a resource path against the backend.
    Url { path: String },
    /// Send one command over the uploads channel.
    Ws(WsArgs),
    /// Show, initialize, toggle, or set the persisted theme.
    Theme(ThemeArgs),
    /// Print a random tagline.
    Tagline {
        #[arg(long, default_value_t = false)]
        include_primary: bool,
    },
}

#[derive(Args, Debug)]
struct WsArgs {
    #[arg(long, env = "YOCR_TOKEN")]
    token: String,

    #[arg(long, default_value = uploads::UPLOADS_SOCKET_PATH)]
    path: String,

    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[arg(long, default_value_t = 0, help = "Print server messages for this long after sending")]
    listen_ms: u64,

    #[command(subcommand)]
    command: WsCommand,
}

#[derive(Subcommand, Debug)]
enum WsCommand {
    Subscribe,
    List,
    Retrieve {
        instance_id: String,
    },
    Delete {
        instance_id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        instance_id: String,
        #[arg(long)]
        data: String,
    },
    Question {
        instance_id: String,
        question: String,
    },
}

#[derive(Args, Debug)]
struct ThemeArgs {
    #[arg(long, default_value = ".yocr", help = "Directory holding persisted client state")]
    store: PathBuf,

    #[arg(long, default_value_t = false, help = "Report a dark color-scheme preference")]
    prefer_dark: bool,

    #[command(subcommand)]
    action: Option<ThemeAction>,
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    Show,
    Init,
    Toggle,
    Set { mode: ThemeMode },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli);

    match cli.command {
        Command::Routes => {
            print_json(&serde_json::to_value(&config)?)?;
            Ok(())
        }
        Command::Url { path } => {
            println!("{}", config.to_absolute_url(&path));
            Ok(())
        }
        Command::Ws(args) => run_ws(&config, args).await,
        Command::Theme(args) => {
            run_theme(args);
            Ok(())
        }
        Command::Tagline { include_primary } => {
            println!("{}", brand::random_tagline(include_primary));
            Ok(())
        }
    }
}

/// Flags (already merged with their env vars by clap) win; the legacy
/// backend alias still comes from the environment.
fn resolve_config(cli: &Cli) -> ClientConfig {
    ClientConfig::from_lookup(|key| match key {
        BACKEND_URL_ENV => cli.backend_url.clone(),
        API_VERSION_ENV => cli.api_version.clone(),
        API_TIMEOUT_ENV => cli.api_timeout.clone(),
        other => std::env::var(other).ok(),
    })
}

async fn run_ws(config: &ClientConfig, args: WsArgs) -> Result<(), CliError> {
    let command = build_command(args.command)?;
    let handle = uploads::open_at(config, &args.token, &args.path);
    let options = SendOptions {
        timeout: Some(Duration::from_millis(args.timeout_ms)),
    };

    uploads::send_command(Some(&handle), &command, options).await?;
    eprintln!("sent {} command", command.kind());

    if args.listen_ms > 0 {
        let deadline = tokio::time::sleep(Duration::from_millis(args.listen_ms));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = &mut deadline => break,
                message = handle.next_message() => match message {
                    Some(text) => println!("{text}"),
                    None => break,
                },
            }
        }
    }

    handle.close();
    if tokio::time::timeout(Duration::from_secs(2), handle.closed()).await.is_err() {
        tracing::warn!("uploads websocket did not close cleanly");
    }
    Ok(())
}

fn build_command(command: WsCommand) -> Result<UploadCommand, CliError> {
    Ok(match command {
        WsCommand::Subscribe => UploadCommand::subscribe(),
        WsCommand::List => UploadCommand::list(),
        WsCommand::Retrieve { instance_id } => UploadCommand::retrieve(instance_id),
        WsCommand::Delete { instance_id } => UploadCommand::delete(instance_id),
        WsCommand::Create { data } => UploadCommand::create(parse_data(&data)?),
        WsCommand::Update { instance_id, data } => {
            UploadCommand::update(instance_id, parse_data(&data)?)
        }
        WsCommand::Question { instance_id, question } => {
            UploadCommand::question(instance_id, question)
        }
    })
}

fn parse_data(raw: &str) -> Result<Map<String, Value>, CliError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::DataNotObject),
    }
}

fn run_theme(args: ThemeArgs) {
    let controller = ThemeController::new(
        FileStore::new(args.store),
        Some(MemorySurface::new(args.prefer_dark)),
    );

    match args.action.unwrap_or(ThemeAction::Show) {
        ThemeAction::Show => {
            let stored = controller.get_stored().map_or("unset", ThemeMode::as_str);
            println!("stored: {stored}");
            println!("preferred: {}", controller.get_preferred());
        }
        ThemeAction::Init => println!("{}", controller.init()),
        ThemeAction::Toggle => println!("{}", controller.toggle(controller.get_stored())),
        ThemeAction::Set { mode } => {
            controller.apply(mode);
            println!("{mode}");
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
