//! Fetch and print an OFP outside the simulator.
//!
//! ```text
//! sbfetch 123456
//! sbfetch 123456 --fms-dir /tmp/plans --notify
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ofp_core::{Config, Prefs, Session, SessionError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sbfetch")]
#[command(about = "Fetch a SimBrief OFP and print the parsed summary", long_about = None)]
struct Cli {
    /// SimBrief pilot id.
    pilot_id: String,

    /// JSON config file; defaults are used for missing keys.
    #[arg(short, long, env = "OFP_CONFIG")]
    config: Option<PathBuf>,

    /// Dispatch base URL, e.g. a local mock server.
    #[arg(long, env = "OFP_BASE_URL")]
    base_url: Option<String>,

    /// Save the FMS plan into this directory.
    #[arg(long)]
    fms_dir: Option<PathBuf>,

    /// Notify ActiveSky after saving the plan.
    #[arg(long, requires = "fms_dir")]
    notify: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(base) = &cli.base_url {
        config = config.with_base_url(base);
    }
    if let Some(dir) = &cli.fms_dir {
        config.fms_dir = dir.clone();
    }

    let prefs = Prefs::new(&cli.pilot_id, cli.fms_dir.is_some(), cli.notify);
    let mut session = Session::new(config, prefs);

    let outcome = session.fetch_ofp();
    let ofp = session.ofp();
    println!("status:         {}", ofp.status);
    println!("time_generated: {}", ofp.time_generated);
    println!("origin:         {}", ofp.origin);
    println!("destination:    {}", ofp.destination);
    println!("fms url:        {}", ofp.download_url());
    println!("valid:          {}", ofp.valid);
    for line in [&session.status().summary, &session.status().fms, &session.status().notify] {
        if !line.is_empty() {
            println!("{line}");
        }
    }

    match outcome {
        Ok(report) => {
            if let Some(path) = report.fms_path {
                info!(path = %path.display(), "plan saved");
            }
            Ok(())
        }
        Err(SessionError::Rejected { status }) => anyhow::bail!("service rejected request: {status}"),
        Err(e) => Err(e.into()),
    }
}
