use clap::{Parser, Subcommand};
use lib::channels::{ChannelHandle, ChannelRegistry, InboundMessage, TelegramChannel, CHAT_CHANNEL_ID};
use lib::pipeline::Pipeline;
use lib::vision::PhotoSource;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "keja")]
#[command(about = "Keja CLI — property-management CRM chat assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Chat with the assistant interactively; replies print directly.
    Chat {
        /// Config file path (default: KEJA_CONFIG_PATH or ~/.keja/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the Telegram connector: long-poll for messages (text and photos) and push replies.
    Serve {
        /// Config file path (default: KEJA_CONFIG_PATH or ~/.keja/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("keja {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Chat { config }) => {
            if let Err(e) = run_chat(config).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config }) => {
            if let Err(e) = run_serve(config).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_chat(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _path) = lib::config::load_config(config_path)?;
    let pipeline = Pipeline::from_config(&config);
    let registry = ChannelRegistry::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        let msg = InboundMessage {
            channel_id: CHAT_CHANNEL_ID.to_string(),
            conversation_id: "local".to_string(),
            text: Some(input.to_string()),
            photo: None,
        };
        let reply = pipeline.handle(&msg, None).await;
        match lib::format::route_reply(&registry, &msg, reply).await {
            Ok(Some(text)) => println!("< {}", text.trim()),
            Ok(None) => {}
            Err(e) => eprintln!("chat error: {}", e),
        }
    }

    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let token = lib::config::resolve_telegram_token(&config);
    if token.is_none() {
        anyhow::bail!(
            "telegram bot token not configured (set TELEGRAM_BOT_TOKEN or channels.telegram.botToken)"
        );
    }

    let pipeline = Pipeline::from_config(&config);
    let registry = ChannelRegistry::new();
    let telegram = Arc::new(TelegramChannel::new(token));
    registry.register("telegram".to_string(), telegram.clone());

    let (tx, mut rx) = tokio::sync::mpsc::channel::<InboundMessage>(32);
    let poll_handle = telegram.clone().start_inbound(tx);
    log::info!("keja serve: listening for Telegram messages (ctrl-c to stop)");

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(msg) = maybe else { break };
                let reply = pipeline
                    .handle(&msg, Some(telegram.as_ref() as &dyn PhotoSource))
                    .await;
                if let Err(e) = lib::format::route_reply(&registry, &msg, reply).await {
                    log::warn!("reply delivery failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                telegram.stop();
                break;
            }
        }
    }

    poll_handle.abort();
    Ok(())
}
