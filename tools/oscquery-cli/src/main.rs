//! OSCQuery CLI
//!
//! Run an OSCQuery service, browse the network for OSC / OSCQuery
//! services, and inspect a peer's tree or host info.

mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::FileConfig;
use oscquery_client::OscQueryClient;
use oscquery_discovery::{Discovery, DiscoveryEvent, MdnsDiscovery};
use oscquery_server::OscQueryServiceBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oscquery")]
#[command(about = "OSCQuery CLI - serve, browse and inspect OSCQuery services")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an OSCQuery service until Ctrl+C
    Serve {
        /// Service name
        #[arg(short, long)]
        name: Option<String>,

        /// HTTP port (0 = any)
        #[arg(long)]
        http_port: Option<u16>,

        /// OSC port being described (0 = any free UDP port)
        #[arg(long)]
        osc_port: Option<u16>,

        /// Listen on all interfaces
        #[arg(long)]
        any: bool,

        /// Report each caller's address as OSC_IP
        #[arg(long)]
        dynamic_ip: bool,

        /// TOML file describing the service and its endpoints
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List OSC and OSCQuery services on the network
    Browse {
        /// How long to listen, in seconds
        #[arg(short, long, default_value = "5")]
        seconds: u64,
    },

    /// Print a peer's node tree (or one subtree) as JSON
    Tree {
        /// Peer address, e.g. 192.168.1.20:8080
        addr: SocketAddr,
        /// OSC path of the subtree
        path: Option<String>,
    },

    /// Print a peer's host info as JSON
    HostInfo {
        /// Peer address, e.g. 192.168.1.20:8080
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            name,
            http_port,
            osc_port,
            any,
            dynamic_ip,
            config,
        } => {
            let file = match config {
                Some(path) => FileConfig::load(&path)?,
                None => FileConfig::default(),
            };

            let mut service_config = file.service_config();
            if let Some(name) = name {
                service_config.server_name = name;
            }
            if let Some(port) = http_port {
                service_config.http_port = port;
            }
            if let Some(port) = osc_port {
                service_config.osc_port = port;
            }
            service_config.listen_any_host |= any;
            service_config.use_dynamic_osc_ip |= dynamic_ip;

            let service = OscQueryServiceBuilder::from_config(service_config).build()?;
            for endpoint in &file.endpoints {
                if let Err(e) = service.add_endpoint(
                    &endpoint.path,
                    &endpoint.osc_type,
                    endpoint.access.into(),
                    endpoint.value.as_deref(),
                    endpoint.description.as_deref(),
                ) {
                    tracing::warn!("Skipping endpoint {}: {}", endpoint.path, e);
                }
            }

            let mut osc_found = service.on_osc_service_found();
            let mut oscquery_found = service.on_oscquery_service_found();
            service.start().await?;

            tracing::info!(
                "Serving {} on port {} (Ctrl+C to stop)",
                service.server_name(),
                service.http_port()
            );

            loop {
                tokio::select! {
                    Some(profile) = osc_found.recv() => {
                        tracing::info!("OSC service found: {}", profile);
                    }
                    Some(profile) = oscquery_found.recv() => {
                        tracing::info!("OSCQuery service found: {}", profile);
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            service.stop();
        }

        Commands::Browse { seconds } => {
            println!("Browsing for {} seconds...", seconds);
            let discovery = MdnsDiscovery::new()?;
            let mut events = discovery.subscribe();
            discovery.refresh_services()?;

            let deadline = tokio::time::sleep(Duration::from_secs(seconds));
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    Some(event) = events.recv() => match event {
                        DiscoveryEvent::Found(profile) => println!("  + {} [{}]", profile, profile.kind()),
                        DiscoveryEvent::Lost { name, kind } => println!("  - {} [{}]", name, kind),
                    },
                    _ = &mut deadline => break,
                }
            }

            let osc = discovery.osc_services();
            let oscquery = discovery.oscquery_services();
            println!(
                "\nFound {} OSC and {} OSCQuery service(s)",
                osc.len(),
                oscquery.len()
            );
            discovery.shutdown()?;
        }

        Commands::Tree { addr, path } => {
            let client = OscQueryClient::new()?;
            let json = match path {
                Some(path) => serde_json::to_string_pretty(&client.node(addr, &path).await?)?,
                None => serde_json::to_string_pretty(client.tree(addr).await?.root())?,
            };
            println!("{}", json);
        }

        Commands::HostInfo { addr } => {
            let client = OscQueryClient::new()?;
            let info = client.host_info(addr).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
