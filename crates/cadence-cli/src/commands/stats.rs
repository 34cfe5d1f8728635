use clap::Args;

use super::state::load_engine;

#[derive(Args)]
pub struct StatsArgs {
    /// Persona key
    pub persona: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;
    let buckets = engine.persona_stats(&args.persona);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
        return Ok(());
    }

    if buckets.is_empty() {
        println!("No outcomes recorded for {}", args.persona);
        return Ok(());
    }

    println!("Outcome statistics for {}:", args.persona);
    println!();
    println!("  hour  samples  acceptance  avg response");
    for bucket in buckets {
        println!(
            "  {:>4}  {:>7}  {:>9.1}%  {:>10.1}s",
            bucket.hour_of_day,
            bucket.stats.sample_count,
            bucket.stats.acceptance_rate * 100.0,
            bucket.stats.avg_response_time_seconds
        );
    }
    Ok(())
}
