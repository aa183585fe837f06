use crate::config_loader::{load_config, ScorerConfig};
use crate::feature_deriver::FeatureDeriver;
use crate::log_sink::init_tracing;
use crate::scoring_service::{LoadedModel, ScoringService};
use crate::web::{build_router, PredictionResponse};
use anyhow::Context;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Top-level CLI for the campaign scorer
#[derive(Parser)]
#[command(
    name = "campaign_scorer",
    version,
    about = "Scores the probability that a customer accepts a marketing campaign"
)]
pub struct Cli {
    /// TOML configuration file (defaults to ./scorer.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (predict, usage, health, model status)
    Serve {
        /// Host/IP to bind, overriding the configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overriding the configuration
        #[arg(long)]
        port: Option<u16>,
    },

    /// Score one JSON record from a file and print the response
    Score {
        #[arg(short, long)]
        input: PathBuf,
        /// Also print the reconciled feature row
        #[arg(long)]
        show_features: bool,
    },

    /// Print the feature schema introspected from the model
    Schema,

    /// Print the effective configuration as TOML
    Config,
}

/// Build the shared scoring service. A model that cannot be loaded is fatal.
pub fn build_service(config: &ScorerConfig) -> anyhow::Result<ScoringService> {
    let model = LoadedModel::from_file(Path::new(&config.model.path))
        .with_context(|| format!("cannot start without model {}", config.model.path))?;
    let deriver = FeatureDeriver::new(
        config
            .features
            .current_year
            .unwrap_or_else(|| Local::now().year()),
        config.enroll_reference()?,
    );
    Ok(ScoringService::new(model, deriver))
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let service = Arc::new(build_service(&config)?);
            let app = build_router(service, config.server.cors);

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build Tokio runtime")?;

            rt.block_on(async move {
                let addr = format!("{host}:{port}");
                let listener = tokio::net::TcpListener::bind(&addr)
                    .await
                    .with_context(|| format!("failed to bind {addr}"))?;
                info!("HTTP server listening on http://{addr}");
                axum::serve(listener, app).await.context("server error")
            })
        }
        Commands::Score {
            input,
            show_features,
        } => {
            let service = build_service(&config)?;
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let payload: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", input.display()))?;

            if show_features {
                match service.prepare(payload.clone()) {
                    Ok(row) => println!("{}", serde_json::to_string_pretty(&row)?),
                    Err(e) => eprintln!("Could not reconcile record: {e}"),
                }
            }
            let response = PredictionResponse::from(service.predict(payload));
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Schema => {
            let service = build_service(&config)?;
            println!("{}", serde_json::to_string_pretty(service.schema())?);
            Ok(())
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["campaign_scorer", "--config", "x.toml", "serve", "--port", "9000"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn score_requires_input() {
        assert!(Cli::try_parse_from(["campaign_scorer", "score"]).is_err());
    }

    #[test]
    fn missing_model_is_fatal() {
        let mut config = ScorerConfig::default();
        config.model.path = "does/not/exist.json".into();
        let err = build_service(&config).err().unwrap();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
