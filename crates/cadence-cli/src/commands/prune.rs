use chrono::{Duration, Utc};
use clap::Args;

use super::state::{load_engine, save_engine};

#[derive(Args)]
pub struct PruneArgs {
    /// Remove users with no intervention in this many hours
    #[arg(long, default_value_t = 24 * 7)]
    pub idle_hours: i64,
}

pub fn run(args: PruneArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.idle_hours < 0 {
        return Err("--idle-hours must not be negative".into());
    }

    let idle = Duration::try_hours(args.idle_hours)
        .ok_or_else(|| format!("--idle-hours {} is out of range", args.idle_hours))?;

    let engine = load_engine()?;
    let removed = engine.prune_history(Utc::now(), idle);
    save_engine(&engine)?;

    println!("Pruned {removed} user(s), {} remaining", engine.tracked_users());
    Ok(())
}
