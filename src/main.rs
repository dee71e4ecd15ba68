use anyhow::Result;
use clap::{Parser, Subcommand};
use ifluxone::config::Config;
use ifluxone::{commands, logging};

#[derive(Parser)]
#[command(name = "ifluxone")]
#[command(version)]
#[command(about = "Cosmic landing page with a streaming Gemini assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and stream the answer to stdout
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Use the slower model with a reasoning budget
        #[arg(long)]
        thinking: bool,
    },
    /// Show configuration or store an API key
    Config {
        /// Save this Gemini API key to the config file
        #[arg(long, value_name = "KEY")]
        set_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    logging::init(&config.log_path())?;

    match cli.command {
        None => {
            // ifluxone with no args = landing page
            commands::launch(config).await
        }
        Some(Commands::Ask { prompt, thinking }) => {
            commands::ask(config, &prompt.join(" "), thinking).await
        }
        Some(Commands::Config { set_key: Some(key) }) => commands::set_key(config, key),
        Some(Commands::Config { set_key: None }) => {
            commands::show_config(&config);
            Ok(())
        }
    }
}
