use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use proxy_reconcile::config::loader::load_config;
use proxy_reconcile::observability::logging;
use proxy_reconcile::reconcile::plan;

#[derive(Parser)]
#[command(name = "config-diff")]
#[command(about = "Show what reloading a proxy configuration would change", long_about = None)]
struct Cli {
    /// Configuration currently in service.
    old: PathBuf,

    /// Configuration about to be loaded.
    new: PathBuf,

    /// Print the plan as JSON.
    #[arg(long)]
    json: bool,

    /// Log level for diagnostics on stderr.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Exits 0 when nothing would change, 1 when something would, 2 on error.
fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    match run(&cli) {
        Ok(true) => ExitCode::from(1),
        Ok(false) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let old = load_config(&cli.old)?;
    let new = load_config(&cli.new)?;

    let plan = plan(&old, &new);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", plan);
    }
    Ok(plan.has_changes())
}
