// ABOUTME: Entry point for vinnie: a terminal client for the Vinnie AI chat backend.
// ABOUTME: Parses CLI args, loads config, sets up logging, and launches the app.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vinnie_chat::app::App;
use vinnie_chat::config::Config;
use vinnie_chat::logging;

#[derive(Parser)]
#[command(name = "vinnie", version, about = "Chat with Vinnie AI from the terminal")]
struct Cli {
    /// Backend base URL (overrides config and VINNIE_SERVER_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    /// JSON history file to seed sessions from.
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    /// Render replies without HTML sanitizing.
    #[arg(long, global = true)]
    no_sanitize: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Full-screen chat (the default).
    Chat,
    /// Send a single prompt and print the reply.
    Send {
        prompt: String,
        /// File to attach (png, jpg, jpeg, pdf, mp3, wav, txt).
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the whole chat page as HTML instead of the reply text.
        #[arg(long)]
        html: bool,
    },
    /// Render markdown from stdin to sanitized HTML.
    Render,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    if cli.no_sanitize {
        config.render.sanitize = false;
    }

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let _guard = logging::init_file_logging(&config)?;
            App::new(config, cli.history).run().await
        }
        Command::Send { prompt, file, html } => {
            logging::init_stderr_logging(&config.log.level);
            App::new(config, cli.history).send_once(prompt, file, html).await
        }
        Command::Render => {
            logging::init_stderr_logging(&config.log.level);
            App::new(config, cli.history).render_stdin()
        }
    }
}
