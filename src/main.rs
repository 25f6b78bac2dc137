use anyhow::Result;
use clap::Parser;
use tracing::info;

use btc_collider::config::Config;
use btc_collider::control::{self, StateCell};
use btc_collider::hunt::{HuntOutcome, Hunter};
use btc_collider::targets::TargetSet;
use btc_collider::utils::format_number;

/// Random Bitcoin keypair collider with live balance checks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Target list path (overrides config)
    #[arg(short, long)]
    targets: Option<String>,

    /// Write the default config to the given path and exit
    #[arg(long)]
    init_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose)?;

    if args.init_config {
        Config::save_default(&args.config)?;
        info!("Default config written to {}", args.config);
        return Ok(());
    }

    // Display banner
    display_banner();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(targets) = args.targets {
        config.targets.file = targets;
    }

    // The target list is the reason to run; missing or unreadable is fatal.
    let targets = TargetSet::load(&config.targets.file)?;

    // Shared run state plus the control-input task on its own timeline.
    // Raw mode makes p/r/q land keystroke-by-keystroke; the guard restores
    // the terminal on exit.
    let raw_mode = control::RawModeGuard::enable();
    if raw_mode.is_none() {
        info!("stdin is not a tty; control commands need Enter");
    }
    let state = StateCell::new();
    control::print_instructions();
    let input_task = control::spawn_input_task(state.clone());

    let hunter = Hunter::new(config, targets, state)?;
    let stats = hunter.stats();

    info!("Starting generation loop...");
    let outcome = hunter.run().await?;

    input_task.abort();

    match &outcome {
        HuntOutcome::Found { address } => info!("Target address matched: {}", address),
        HuntOutcome::Quit => info!(">> Program has been quit."),
    }

    // Final statistics
    info!("═══════════════════════════════════════════════");
    info!("FINAL STATISTICS:");
    info!("Generated: {}", format_number(stats.generated()));
    info!("Balance hits: {}", stats.balance_hits());
    info!("Rate: {:.2} keys/s", stats.rate());
    info!("Elapsed: {:.2}s", stats.elapsed());
    info!("═══════════════════════════════════════════════");

    Ok(())
}

fn display_banner() {
    println!(
        "
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║   🎲 BTC COLLIDER v{}                                   ║
║   Random Keypair Generator + Balance Sweep                ║
║                                                           ║
║   ⚠️  EDUCATIONAL PURPOSE ONLY                            ║
║   The search space is 2^256; treat hits as a curiosity    ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
    ",
        btc_collider::VERSION
    );
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .init();

    Ok(())
}
