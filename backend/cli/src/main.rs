mod check_key_cmd;
mod config;
mod models_cmd;
mod normalize_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use signvision_config::defaults::DEFAULT_PORT;
use signvision_config::redacted_config;
use signvision_core::CoordinateScale;
use signvision_understanding::DEFAULT_MAX_DETECTIONS;

#[derive(Parser)]
#[command(name = "signvision")]
#[command(about = "SignVision: street sign and crosswalk detection relay")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file (default: $SIGNVISION_CONFIG or ~/.signvision/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// List models available to the configured key
    Models,
    /// Verify the configured API key
    CheckKey,
    /// Show the status of a running server
    Status {
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Normalize a saved model reply (stdin when FILE is omitted)
    Normalize {
        file: Option<PathBuf>,
        /// Coordinate scale of the reply: unit (0-1) or percent (0-100)
        #[arg(short, long, default_value = "unit")]
        scale: CoordinateScale,
        #[arg(long, default_value_t = DEFAULT_MAX_DETECTIONS)]
        max_detections: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            terminal_output::note_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Serve { port, bind } => {
            let config = config::load(cli.config.as_deref()).await?;
            let config = config::apply_serve_flags(config, port, bind);
            config::init_logging(&config);
            info!(
                addr = %config.server.addr(),
                provider = %config.model.provider,
                prompt = %config.detection.prompt,
                "Starting SignVision"
            );
            tracing::debug!(config = %redacted_config(&config), "Effective config");
            signvision_gateway::run(&config).await?;
            Ok(true)
        }
        Commands::Models => {
            let config = config::load(cli.config.as_deref()).await?;
            models_cmd::run(&config).await?;
            Ok(true)
        }
        Commands::CheckKey => {
            let config = config::load(cli.config.as_deref()).await?;
            check_key_cmd::run(&config).await
        }
        Commands::Status { port } => status_cmd::run(port).await,
        Commands::Normalize {
            file,
            scale,
            max_detections,
        } => {
            normalize_cmd::run(file.as_deref(), scale, max_detections)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_normalize_scale() {
        let cli = Cli::try_parse_from(["signvision", "normalize", "reply.txt", "--scale", "percent"]).unwrap();
        match cli.command {
            Commands::Normalize { file, scale, .. } => {
                assert_eq!(file, Some(PathBuf::from("reply.txt")));
                assert_eq!(scale, CoordinateScale::Percent);
            }
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from(["signvision", "serve", "--port", "9000", "--bind", "127.0.0.1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { port: Some(9000), bind: Some(ref b) } if b == "127.0.0.1"
        ));
    }
}
