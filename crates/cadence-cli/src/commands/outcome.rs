//! Outcome command.
//!
//! Records an intervention outcome, appends it to `outcomes.jsonl` and
//! saves the engine state. Prints the retune it triggered, if any.

use std::fs::OpenOptions;

use cadence_core::{JsonLinesSink, OutcomeRecord, OutcomeSink};
use chrono::{Local, Timelike, Utc};
use clap::Args;

use super::state::{load_engine, outcomes_path, save_engine};

#[derive(Args)]
pub struct OutcomeArgs {
    /// User ID
    #[arg(long)]
    pub user: String,

    /// Persona key
    #[arg(long)]
    pub persona: String,

    /// Local hour of delivery, 0-23 (defaults to the current hour)
    #[arg(long)]
    pub hour: Option<u32>,

    /// The intervention was accepted
    #[arg(long, conflicts_with = "rejected")]
    pub accepted: bool,

    /// The intervention was dismissed
    #[arg(long)]
    pub rejected: bool,

    /// Seconds until the user responded
    #[arg(long, default_value_t = 0.0)]
    pub response_time: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: OutcomeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.accepted && !args.rejected {
        return Err("one of --accepted or --rejected is required".into());
    }

    let record = OutcomeRecord {
        user_id: args.user,
        persona: args.persona,
        hour_of_day: args.hour.unwrap_or_else(|| Local::now().hour()),
        accepted: args.accepted,
        response_time_seconds: args.response_time,
        timestamp: Utc::now(),
    };

    let engine = load_engine()?;
    let event = engine.record_outcome(&record)?;
    save_engine(&engine)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(outcomes_path()?)?;
    let sink = JsonLinesSink::new(file);
    sink.persist(&record)?;
    sink.flush()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    println!("Outcome recorded");
    if let Some(event) = event {
        println!(
            "  Retuned {} ({:?}, acceptance {:.0}% over {} samples)",
            event.persona,
            event.direction,
            event.acceptance_rate * 100.0,
            event.sample_count
        );
        println!(
            "  morning {:.1} -> {:.1}  afternoon {:.1} -> {:.1}{}",
            event.before.morning,
            event.after.morning,
            event.before.afternoon,
            event.after.afternoon,
            if event.clamped { "  (clamped)" } else { "" }
        );
    }
    Ok(())
}
