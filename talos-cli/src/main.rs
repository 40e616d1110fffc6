use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

use talos_core::application::agent::{Agent, AgentOptions, UserInput};
use talos_core::application::tooling::{FolderDiscovery, ToolRegistry, register_discovered};
use talos_core::config::AgentConfig;
use talos_core::infrastructure::model::OpenAIClient;
use talos_core::{AgentError, ConfigError};

#[derive(Parser, Debug)]
#[command(
    name = "talos",
    version,
    about = "Command-line agent that answers by running external tools"
)]
struct Cli {
    /// The request for the agent; all positional words are joined
    prompt: Vec<String>,

    /// Config file path (default: ~/.config/talos/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop for user input after every answer, not only on confirmations
    #[arg(short, long)]
    interactive: bool,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Override the configured tools folder
    #[arg(long, value_name = "DIR")]
    tools_dir: Option<PathBuf>,

    /// Override the configured iteration limit
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Replace the built-in system prompt
    #[arg(long, value_name = "TEXT")]
    system: Option<String>,

    /// Log errors only
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let query = cli.prompt.join(" ").trim().to_string();
    if query.is_empty() {
        eprintln!("Tidak ada prompt yang diberikan. Contoh: talos \"berapa ukuran folder ini?\"");
        return ExitCode::from(2);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Gagal memuat konfigurasi: {err}");
            return ExitCode::from(2);
        }
    };

    match run(&cli, config, query).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.user_message());
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, config: AgentConfig, query: String) -> Result<(), AgentError> {
    let mut registry = ToolRegistry::new();
    let discovery = FolderDiscovery::new(config.tools_dir.clone());
    let count = register_discovered(&mut registry, &discovery).await;
    info!(tools = count, path = %config.tools_dir.display(), "Tool registry ready");

    let provider = OpenAIClient::from_config(&config);
    let options = AgentOptions {
        system_prompt: None,
        interactive: cli.interactive,
    };

    let mut agent = Agent::new(provider, config, registry, Box::new(StdinInput::new()));
    let outcome = agent.run(query, options).await?;

    // In interactive mode every answer was already shown while soliciting.
    if !cli.interactive {
        println!("{}", outcome.response);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AgentConfig, ConfigError> {
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(tools_dir) = &cli.tools_dir {
        config.tools_dir = tools_dir.clone();
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(system) = &cli.system {
        config.system_prompt = Some(system.clone());
    }
    Ok(config)
}

fn init_tracing(quiet: bool) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = if quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        // Logs go to stderr; stdout carries only the agent's answer.
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}

/// Reads suspension replies from the terminal, echoing the assistant's
/// pending message first.
struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl UserInput for StdinInput {
    async fn solicit(&mut self, assistant_message: &str) -> Result<Option<String>, std::io::Error> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("\n{assistant_message}\n\nanda> ").as_bytes())
            .await?;
        stdout.flush().await?;
        self.lines.next_line().await
    }
}
