//! Vital Affect Agent CLI
//!
//! Physiological monitoring and emotion estimation agent.

use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vital_affect_agent::{
    config::{Config, NormProfile},
    ingest::IngestWorker,
    link::{SimLinkConfig, SimulatedLink},
    publish::StatePublisher,
    server::{self, ServerConfig},
    VERSION,
};

#[derive(Parser)]
#[command(name = "vital-affect")]
#[command(version = VERSION)]
#[command(about = "Physiological monitoring and emotion estimation agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent with a simulated sensor link
    Start {
        /// Port for the HTTP read surface (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Norm profile to score against (overrides config)
        #[arg(long)]
        norm_profile: Option<String>,

        /// Drop the simulated link after this many samples, then recover
        #[arg(long)]
        disconnect_after: Option<usize>,

        /// Simulated sample interval in milliseconds
        #[arg(long, default_value = "1000")]
        sample_interval_ms: u64,
    },

    /// Query a running agent and print its current state
    Status {
        /// Port the agent is listening on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config,

    /// List the built-in norm profiles
    Norms,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            port,
            norm_profile,
            disconnect_after,
            sample_interval_ms,
        } => {
            cmd_start(port, norm_profile, disconnect_after, sample_interval_ms);
        }
        Commands::Status { port } => {
            cmd_status(port);
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Norms => {
            cmd_norms();
        }
    }
}

fn cmd_start(
    port: Option<u16>,
    norm_profile: Option<String>,
    disconnect_after: Option<usize>,
    sample_interval_ms: u64,
) {
    println!("Vital Affect Agent v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(port) = port {
        config.server_port = port;
    }
    if let Some(profile) = norm_profile {
        config.norm_profile = profile;
    }

    // Fail before any threads start if the profile is unknown
    if let Err(e) = config.norms() {
        eprintln!("Error: {e}");
        eprintln!("Run `vital-affect norms` to list available profiles.");
        std::process::exit(1);
    }

    println!("Starting agent...");
    println!("  Norm profile: {}", config.norm_profile);
    println!("  Retention: {}s", config.retention_secs);
    println!(
        "  Compute interval: {}ms",
        config.compute_interval.as_millis()
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let publisher = Arc::new(StatePublisher::new(config.display_secs));

    let link_config = SimLinkConfig {
        sample_interval: Duration::from_millis(sample_interval_ms),
        disconnect_after,
        ..SimLinkConfig::default()
    };
    let mut link = SimulatedLink::new(link_config);
    if let Err(e) = link.start() {
        eprintln!("Error starting sensor link: {e}");
        std::process::exit(1);
    }

    let server_port = config.server_port;
    let worker = match IngestWorker::start(config, link.receiver().clone(), publisher.clone()) {
        Ok(worker) => worker,
        Err(e) => {
            eprintln!("Error starting ingestion: {e}");
            std::process::exit(1);
        }
    };

    // The read surface runs on its own tokio runtime; the rest of the agent
    // stays on plain threads.
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let (addr, shutdown_tx) = match runtime.block_on(server::run(
        ServerConfig::new(server_port),
        publisher.clone(),
    )) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };
    println!("State endpoint: http://{addr}/state");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping agent...");
    let _ = shutdown_tx.send(());
    link.stop();
    drop(worker);

    let state = publisher.read();
    println!(
        "Final state: {} after {} cycles ({} samples held)",
        state.emotion,
        state.cycle,
        state.history.len()
    );
}

fn cmd_status(port: Option<u16>) {
    let config = Config::load().unwrap_or_default();
    let port = port.unwrap_or(config.server_port);
    let url = format!("http://127.0.0.1:{port}/state");

    let state: serde_json::Value = match reqwest::blocking::get(&url).and_then(|r| r.json()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Could not reach agent at {url}: {e}");
            eprintln!("Is the agent running? Try `vital-affect start`.");
            std::process::exit(1);
        }
    };

    println!("Vital Affect Agent Status");
    println!("=========================");
    println!();
    println!(
        "  Emotion: {}",
        state["emotion"].as_str().unwrap_or("unknown")
    );
    println!("  Stale: {}", state["stale"]);
    println!("  Cycle: {}", state["cycle"]);
    println!();
    println!("Metrics:");
    for (label, key) in [
        ("Heart rate (bpm)", "hr_mean"),
        ("Respiration (bpm)", "br_mean"),
        ("SDNN (ms)", "sdnn"),
        ("RMSSD (ms)", "rmssd"),
        ("LF/HF", "lf_hf"),
        ("Valence", "valence"),
        ("Arousal", "arousal"),
    ] {
        match state["metrics"][key].as_f64() {
            Some(value) => println!("  {label}: {value:.2}"),
            None => println!("  {label}: absent"),
        }
    }
    println!();
    println!(
        "Samples held: {}",
        state["history"].as_array().map(|a| a.len()).unwrap_or(0)
    );
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_norms() {
    println!("Built-in norm profiles");
    println!("======================");
    println!();
    for (name, profile) in NormProfile::builtin() {
        println!("{name}:");
        println!(
            "  HR: {:.2} ± {:.2} bpm",
            profile.hr.mean, profile.hr.std
        );
        println!(
            "  SDNN: {:.1} ± {:.1} ms",
            profile.sdnn.mean, profile.sdnn.std
        );
        println!(
            "  LF/HF: {:.2} ± {:.2}",
            profile.lf_hf.mean, profile.lf_hf.std
        );
        println!(
            "  Respiration: {:.1} ± {:.1} breaths/min",
            profile.br.mean, profile.br.std
        );
        println!();
    }
}
