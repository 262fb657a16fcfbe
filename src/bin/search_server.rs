use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use seekd::core::config::Config;
use seekd::net::server::SearchServer;

/// Bilingual corpus search server.
#[derive(Parser)]
#[command(name = "search_server")]
#[command(about = "Serve keyword recommendation and web-page search over TCP")]
struct Cli {
    /// Listen address; overrides the config file.
    ip: Option<String>,

    /// Listen port; overrides the config file.
    port: Option<u16>,

    /// Configuration file (key=value lines).
    #[arg(long, short, default_value = "conf/search.conf")]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(ip) = cli.ip {
        config.server_ip = ip;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, shutdown.clone()) {
            error!(signal, error = %e, "cannot register signal handler");
            return ExitCode::FAILURE;
        }
    }

    let server = SearchServer::new(config, shutdown);
    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
