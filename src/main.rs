use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lumen_core::Domain;
use lumen_core::bootstrap::{App, build_shutdown, resolve_config_path};
use lumen_core::config::Config;
use lumen_gateway::GatewayServer;

#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(about = "Retrieval-augmented chat backend", version)]
struct Args {
    /// Path to the TOML config file (default: $LUMEN_CONFIG or config/default.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Assistant profile: mental_health or books
    #[arg(long)]
    domain: Option<Domain>,

    /// Port to listen on, overriding gateway.port
    #[arg(long)]
    port: Option<u16>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    if let Some(domain) = args.domain {
        config.knowledge.domain = domain;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_subscriber();

    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let app = App::from_config(config).await?;
    tracing::info!(
        domain = %app.config.knowledge.domain,
        documents = app.knowledge.len().await,
        "lumen ready"
    );

    let (shutdown_tx, shutdown_rx) = build_shutdown();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &app.config.gateway.bind,
        app.config.gateway.port,
        app.chat,
        shutdown_rx,
    )
    .with_route_prefix(app.config.route_prefix())
    .with_max_body_size(app.config.gateway.max_body_size)
    .serve()
    .await?;

    Ok(())
}
