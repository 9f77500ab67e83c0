use clap::{Parser, Subcommand};
use ndpxd::config;
use ndpxd::telemetry::{LogConfig, init_logging};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ndpxd")]
#[command(about = "An IPv6 neighbor discovery responder and proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every responder and proxy from a config file
    Run {
        /// Path to ndpxd.toml
        #[arg(short, long, default_value = "ndpxd.toml")]
        config: PathBuf,
    },
    /// Answer solicitations on a single interface
    Responder {
        /// Interface to answer on
        iface: String,
        /// Semicolon-separated networks to answer for, or "auto" to
        /// answer for the interface's own networks
        filter: Option<String>,
    },
    /// Relay neighbor discovery between two interfaces
    Proxy {
        /// Side the solicitations to answer arrive on
        wan: String,
        /// Side holding the hosts being advertised
        lan: String,
        /// Semicolon-separated networks to relay, or "auto" to use
        /// the lan side's own networks
        filter: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate ndpxd.toml without starting anything
    Validate {
        /// Path to ndpxd.toml
        #[arg(short, long, default_value = "ndpxd.toml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { config }) => {
            if let Err(e) = cmd_run(&config) {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Responder { iface, filter }) => {
            if let Err(e) = cmd_responder(&iface, filter.as_deref()) {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Proxy { wan, lan, filter }) => {
            if let Err(e) = cmd_proxy(&wan, &lan, filter.as_deref()) {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Validate {
                config: config_path,
            } => {
                if let Err(e) = cmd_config_validate(&config_path) {
                    eprintln!("[ERROR] {}", e);
                    std::process::exit(1);
                }
            }
        },
        None => {
            // Default: run with ndpxd.toml
            if let Err(e) = cmd_run(&PathBuf::from("ndpxd.toml")) {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn cmd_run(config_path: &PathBuf) -> Result<(), String> {
    use ndpxd::engine;
    use ndpxd::monitor::InterfaceMonitor;
    use ndpxd::telemetry::EngineMetrics;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    let cfg =
        config::load(config_path).map_err(|e| format!("Failed to load config: {}", e))?;

    let log_config = LogConfig {
        level: cfg.log.level.clone(),
        format: cfg.log.format.clone(),
    };
    init_logging(Some(&log_config));

    info!("Loaded {}", config_path.display());

    let validation = config::validate(&cfg);
    validation.print_diagnostics();
    if validation.has_errors() {
        return Err("Validation failed with errors".to_string());
    }

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;

    rt.block_on(async move {
        let monitor = Arc::new(InterfaceMonitor::new());
        let metrics = Arc::new(EngineMetrics::new());

        let mut responders = Vec::new();
        for rc in &cfg.responders {
            let settings = engine::ResponderConfig {
                iface: rc.iface.clone(),
                filter: rc.filter.clone(),
                autosense: rc.autosense.clone(),
                monitor_changes: rc.monitor_changes,
            };
            let mut responder =
                engine::Responder::new(settings, Arc::clone(&monitor), Arc::clone(&metrics))
                    .map_err(|e| format!("responder on {}: {}", rc.iface, e))?;
            responder
                .start()
                .await
                .map_err(|e| format!("responder on {}: {}", rc.iface, e))?;
            responders.push(responder);
        }

        let mut proxies = Vec::new();
        for pc in &cfg.proxies {
            let settings = engine::ProxyConfig {
                wan_iface: pc.wan.clone(),
                lan_iface: pc.lan.clone(),
                filter: pc.filter.clone(),
                autosense: pc.autosense.clone(),
                monitor_changes: pc.monitor_changes,
            };
            let mut proxy =
                engine::Proxy::new(settings, Arc::clone(&monitor), Arc::clone(&metrics))
                    .map_err(|e| format!("proxy {}/{}: {}", pc.wan, pc.lan, e))?;
            proxy
                .start()
                .await
                .map_err(|e| format!("proxy {}/{}: {}", pc.wan, pc.lan, e))?;
            proxies.push(proxy);
        }

        if responders.is_empty() && proxies.is_empty() {
            return Err("No responders or proxies configured".to_string());
        }

        wait_for_shutdown().await;
        info!("Shutting down...");

        let mut clean = true;
        for responder in responders {
            clean &= responder.stop().await;
        }
        for proxy in proxies {
            clean &= proxy.stop().await;
        }

        info!("Packet counters at shutdown:");
        for (name, value) in metrics.export() {
            info!("  {}: {}", name, value);
        }

        if clean {
            Ok(())
        } else {
            Err("Shutdown timed out waiting for workers".to_string())
        }
    })
}

fn cmd_responder(iface: &str, filter: Option<&str>) -> Result<(), String> {
    use ndpxd::engine;
    use ndpxd::monitor::InterfaceMonitor;
    use ndpxd::telemetry::EngineMetrics;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    init_logging(None);

    let (filter, autosense) = split_filter_arg(iface, filter);
    let settings = engine::ResponderConfig {
        iface: iface.to_string(),
        filter,
        autosense,
        monitor_changes: true,
    };

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;

    rt.block_on(async move {
        let monitor = Arc::new(InterfaceMonitor::new());
        let metrics = Arc::new(EngineMetrics::new());

        let mut responder = engine::Responder::new(settings, monitor, metrics)
            .map_err(|e| e.to_string())?;
        responder.start().await.map_err(|e| e.to_string())?;

        wait_for_shutdown().await;
        info!("Shutting down...");

        if responder.stop().await {
            Ok(())
        } else {
            Err("Shutdown timed out waiting for workers".to_string())
        }
    })
}

fn cmd_proxy(wan: &str, lan: &str, filter: Option<&str>) -> Result<(), String> {
    use ndpxd::engine;
    use ndpxd::monitor::InterfaceMonitor;
    use ndpxd::telemetry::EngineMetrics;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    init_logging(None);

    let (filter, autosense) = split_filter_arg(lan, filter);
    let settings = engine::ProxyConfig {
        wan_iface: wan.to_string(),
        lan_iface: lan.to_string(),
        filter,
        autosense,
        monitor_changes: true,
    };

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;

    rt.block_on(async move {
        let monitor = Arc::new(InterfaceMonitor::new());
        let metrics = Arc::new(EngineMetrics::new());

        let mut proxy =
            engine::Proxy::new(settings, monitor, metrics).map_err(|e| e.to_string())?;
        proxy.start().await.map_err(|e| e.to_string())?;

        wait_for_shutdown().await;
        info!("Shutting down...");

        if proxy.stop().await {
            Ok(())
        } else {
            Err("Shutdown timed out waiting for workers".to_string())
        }
    })
}

/// "auto" selects autosense against `auto_iface`; anything else is a
/// static filter list.
fn split_filter_arg(auto_iface: &str, filter: Option<&str>) -> (Vec<String>, Option<String>) {
    match filter {
        Some("auto") => (Vec::new(), Some(auto_iface.to_string())),
        Some(list) => (vec![list.to_string()], None),
        None => (Vec::new(), None),
    }
}

async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Received interrupt"),
                _ = sigterm.recv() => info!("Received terminate"),
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received interrupt");
        }
    }
}

fn cmd_config_validate(config_path: &PathBuf) -> Result<(), String> {
    println!("[INFO] Validating {}...", config_path.display());

    let cfg = config::load(config_path).map_err(|e| format!("Failed to parse config: {}", e))?;

    let validation = config::validate(&cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        Err("Validation failed".to_string())
    } else {
        println!("[INFO] Configuration is valid");
        Ok(())
    }
}
