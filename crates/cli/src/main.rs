use anyhow::Context;
use booknest_kernel::settings::Settings;
use clap::{Args, Parser, Subcommand};

/// Command-line entrypoint for BookNest
#[derive(Debug, Parser)]
#[command(name = "booknest", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to the store and serve the HTTP API
    Serve(EnvArgs),
    /// Check that the configured store is reachable
    Ping(EnvArgs),
    /// Print the resolved settings as JSON
    Config(EnvArgs),
}

#[derive(Debug, Args)]
struct EnvArgs {
    /// Deployment environment (local, staging, production); defaults to BOOKNEST_ENV
    #[arg(long = "env")]
    environment: Option<String>,
}

impl EnvArgs {
    fn settings(&self) -> anyhow::Result<Settings> {
        Settings::load_for(self.environment.as_deref())
            .with_context(|| "failed to load BookNest settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            let settings = args.settings()?;
            booknest_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "serving BookNest API");
            booknest::run(&settings).await
        }
        Command::Ping(args) => {
            let settings = args.settings()?;
            booknest_telemetry::init(&settings.telemetry).ok();
            booknest::modules::books::store::connect(&settings.database)
                .await
                .context("book store is unreachable")?;
            println!("store reachable: {}", settings.database.database);
            Ok(())
        }
        Command::Config(args) => {
            let settings = args.settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
