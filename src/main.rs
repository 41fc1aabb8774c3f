//! Replident - MySQL/MariaDB Replication Identity
//!
//! Command-line tool that derives a host's replication server-id from its
//! MAC address and reports host identity facts, locally or over HTTP.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use replident::api::HttpServer;
use replident::config::ReplidentConfig;
use replident::error::Result;
use replident::facts::{FactName, FactRegistry, FixedMacProvider};
use replident::identity::MacAddress;

/// Replident - MySQL/MariaDB Replication Identity
#[derive(Parser)]
#[command(name = "replident")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "replident.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate and print all host facts
    Facts {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Override the macaddress fact (e.g. 3c:97:0e:69:fb:e1)
        #[arg(long)]
        mac: Option<MacAddress>,
    },

    /// Derive and print the replication server-id
    ServerId {
        /// Override the macaddress fact (e.g. 3c:97:0e:69:fb:e1)
        #[arg(long)]
        mac: Option<MacAddress>,
    },

    /// Run the HTTP agent
    Serve,

    /// Query a running agent's facts
    Status {
        /// Agent address to query
        #[arg(short, long, default_value = "localhost:9306")]
        address: String,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "replident.toml")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Facts { json, mac } => run_facts(cli.config, json, mac),
        Commands::ServerId { mac } => run_server_id(cli.config, mac),
        Commands::Serve => run_serve(cli.config).await,
        Commands::Status { address } => run_status(address).await,
        Commands::Init { output } => run_init(output),
        Commands::Validate => run_validate(cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load configuration, falling back to defaults when the file is absent
fn load_config(path: &std::path::Path) -> Result<ReplidentConfig> {
    if path.exists() {
        ReplidentConfig::from_file(path)
    } else {
        tracing::debug!("No configuration file at {:?}, using defaults", path);
        Ok(ReplidentConfig::default())
    }
}

/// Build the fact registry, honoring a MAC override
fn build_registry(config: &ReplidentConfig, mac_override: Option<MacAddress>) -> FactRegistry {
    let mut registry = FactRegistry::standard(&config.facts);
    if let Some(mac) = mac_override {
        registry.register(Box::new(FixedMacProvider::new(Some(mac))));
    }
    registry
}

/// Evaluate and print all host facts
fn run_facts(config_path: PathBuf, json: bool, mac: Option<MacAddress>) -> Result<()> {
    let config = load_config(&config_path)?;
    let registry = build_registry(&config, mac);
    let snapshot = registry.snapshot()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
    } else {
        for (name, resolution) in &snapshot.facts {
            println!("{:<20} {}", name.as_str(), resolution.render());
        }
    }

    Ok(())
}

/// Derive and print the replication server-id
fn run_server_id(config_path: PathBuf, mac: Option<MacAddress>) -> Result<()> {
    let config = load_config(&config_path)?;
    let registry = build_registry(&config, mac);

    // Undetectable prints as an empty line: "no id", never a zero id
    let resolution = registry.evaluate().resolve(FactName::MysqlServerId)?;
    println!("{}", resolution.render());

    Ok(())
}

/// Run the HTTP agent
async fn run_serve(config_path: PathBuf) -> Result<()> {
    tracing::info!("Starting replident agent...");

    let config = match ReplidentConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            tracing::error!("Please check that the config file exists and is valid TOML");
            return Err(e);
        }
    };

    if !config.api.enabled {
        tracing::warn!("API is disabled in configuration; nothing to serve");
        return Ok(());
    }

    let registry = FactRegistry::standard(&config.facts);
    let http_server = HttpServer::new(config.api.clone(), registry);

    tokio::select! {
        result = http_server.start() => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }

    tracing::info!("Replident shutdown complete");
    Ok(())
}

/// Query a running agent's facts
async fn run_status(address: String) -> Result<()> {
    let url = format!("http://{}/facts", address);

    match reqwest::get(&url).await {
        Ok(response) => {
            let facts: serde_json::Value = response
                .json()
                .await
                .map_err(|e| replident::error::Error::Network(e.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&facts).unwrap());
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to query agent: {}", e);
            Err(replident::error::Error::Network(e.to_string()))
        }
    }
}

/// Initialize configuration file
fn run_init(output: PathBuf) -> Result<()> {
    let config_content = r#"# Replident Configuration
# Generated configuration file

[facts]
# Prefer a specific interface for the macaddress fact
# interface = "eth0"

# mysqld binary probed by the mysqld_version fact
mysqld_path = "mysqld"

[api]
enabled = true
bind_address = "0.0.0.0:9306"
"#;

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to adjust fact gathering and the agent address.");
    println!(
        "Then start the agent with: replident --config {} serve",
        output.display()
    );

    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match ReplidentConfig::from_file(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  mysqld path:    {}", config.facts.mysqld_path);
            println!(
                "  Interface:      {}",
                config
                    .facts
                    .interface
                    .as_deref()
                    .unwrap_or("(first non-loopback)")
            );
            println!("  API enabled:    {}", config.api.enabled);
            println!("  API address:    {}", config.api.bind_address);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}
