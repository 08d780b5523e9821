//! Print the Keno paytable with its theoretical return per spot count,
//! and the Mines full-board multipliers for the configured house edge.

use clap::Parser;
use crownwynn::{
    config::ConfigLoader,
    games::{keno::MAX_SPOTS, mines::{MAX_MINES, MIN_MINES}},
};

#[derive(Parser, Debug)]
#[command(name = "paytable_report")]
struct Args {
    /// Path to a TOML configuration file (defaults are used otherwise)
    #[arg(long)]
    config: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    let paytable = &config.keno.paytable;
    println!("Keno paytable {}", paytable.version);
    println!("==================");
    for spots in 1..=MAX_SPOTS {
        let row: Vec<String> = paytable
            .payouts
            .iter()
            .filter(|e| e.spots as usize == spots)
            .map(|e| format!("{}:{}x", e.matches, e.multiplier))
            .collect();
        println!(
            "{:>2} spots  RTP {:>7.3}%  max {:>10}x  [{}]",
            spots,
            paytable.expected_return(spots) * 100.0,
            paytable.max_multiplier(spots).to_string(),
            row.join(", ")
        );
    }

    let curve = config.mines.payout_curve();
    println!();
    println!("Mines (house edge {}bp)", curve.house_edge_bp);
    println!("==================");
    for mines in MIN_MINES..=MAX_MINES {
        println!(
            "{:>2} mines  first tile {:>10}x  full board {:>16}x",
            mines,
            curve.multiplier(1, mines)?.to_string(),
            curve.max_multiplier(mines)?.to_string()
        );
    }

    Ok(())
}
