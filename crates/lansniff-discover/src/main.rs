//! CLI entry point for the lansniff LAN scanner.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lansniff_discover::config::{DiscoveryMode, ReportMode, ScanConfig};
use lansniff_discover::scanner::NetworkScanner;

#[derive(Parser)]
#[command(name = "lansniff")]
#[command(about = "List the hosts on a local subnet with their names and vendors")]
struct Cli {
    /// Subnet to scan (CIDR notation, e.g. 192.168.1.0/24). Defaults to the
    /// configured range.
    range: Option<String>,

    /// Print one block per device instead of a table.
    #[arg(short, long)]
    detailed: bool,

    /// Per-host hostname resolution timeout in seconds.
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Maximum concurrent hostname resolutions.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Discovery mode: auto, active, passive.
    #[arg(long)]
    discovery: Option<String>,

    /// Network interface to probe from.
    #[arg(short, long)]
    interface: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Config file prefix (default: lansniff).
    #[arg(short, long, default_value = "lansniff")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    lansniff_discover::runtime::run(scan(cli))?
}

async fn scan(cli: Cli) -> anyhow::Result<()> {
    let mut scan_config: ScanConfig =
        lansniff_core::config::load_section(&cli.config, "LANSNIFF", "scan")?;
    apply_overrides(&mut scan_config, &cli)?;

    let scanner = NetworkScanner::from_config(scan_config)?;
    let report = scanner.scan().await?;

    println!("{}", report.render(scanner.config().mode));
    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_overrides(config: &mut ScanConfig, cli: &Cli) -> anyhow::Result<()> {
    if let Some(range) = &cli.range {
        config.range = range.clone();
    }
    if cli.detailed {
        config.mode = ReportMode::Detailed;
    }
    if let Some(secs) = cli.timeout {
        config.per_host_timeout_secs = secs;
    }
    if let Some(jobs) = cli.jobs {
        config.pool_size = jobs;
    }
    if let Some(mode) = &cli.discovery {
        config.discovery = parse_discovery(mode)?;
    }
    if let Some(interface) = &cli.interface {
        config.interface = Some(interface.clone());
    }
    Ok(())
}

fn parse_discovery(s: &str) -> anyhow::Result<DiscoveryMode> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(DiscoveryMode::Auto),
        "active" => Ok(DiscoveryMode::Active),
        "passive" => Ok(DiscoveryMode::Passive),
        _ => anyhow::bail!("Invalid discovery mode: {s}. Choose: auto, active, passive"),
    }
}
