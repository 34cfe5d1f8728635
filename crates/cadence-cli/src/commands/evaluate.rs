//! Evaluate command.
//!
//! Runs one scheduling decision. A permitted decision claims the user's
//! intervention slot, so the updated state is saved either way.

use cadence_core::{ContentGenerator, SignalReadings, SignalSnapshot, TemplateContentGenerator};
use chrono::{DateTime, FixedOffset, Local};
use clap::Args;

use super::state::{load_engine, save_engine};

#[derive(Args)]
pub struct EvaluateArgs {
    /// User ID
    #[arg(long)]
    pub user: String,

    /// Persona key (unknown personas use the default profile)
    #[arg(long, default_value = "manager")]
    pub persona: String,

    /// Cognitive load (0.0-1.0)
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub load: f64,

    /// Minutes of continuous focus on the current task
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub focus: f64,

    /// Recent interruption count
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub interruptions: i64,

    /// Productivity score (0.0-1.0)
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub productivity: f64,

    /// Observation time, RFC 3339 (defaults to now, local time)
    #[arg(long)]
    pub at: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: EvaluateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let timestamp: DateTime<FixedOffset> = match &args.at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid --at '{raw}': {e}"))?,
        None => Local::now().fixed_offset(),
    };

    let snapshot = SignalSnapshot::new(
        args.user.clone(),
        args.persona.clone(),
        SignalReadings {
            cognitive_load: args.load,
            focus_duration_minutes: args.focus,
            interruption_count_recent: args.interruptions,
            productivity_score: args.productivity,
        },
        timestamp,
    );

    let engine = load_engine()?;
    let decision = engine.evaluate(&args.user, &snapshot);
    save_engine(&engine)?;

    let content = match decision.category {
        Some(category) => Some(TemplateContentGenerator.generate(category, &snapshot)?),
        None => None,
    };

    if args.json {
        let mut value = serde_json::to_value(&decision)?;
        if let (Some(obj), Some(text)) = (value.as_object_mut(), &content) {
            obj.insert("content".to_string(), serde_json::Value::String(text.clone()));
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if decision.permitted {
        println!("Permitted ({:?})", decision.reason);
    } else {
        println!("Denied ({:?})", decision.reason);
    }
    println!("  Persona:   {}", decision.persona);
    println!("  Day part:  {}", decision.day_part);
    if let Some(interval) = decision.adjusted_interval_minutes {
        println!("  Interval:  {interval:.1} min");
    }
    println!("  In flow:   {}", decision.in_flow);
    if let (Some(category), Some(text)) = (decision.category, content) {
        println!("  Category:  {category}");
        println!();
        println!("{text}");
    }

    Ok(())
}
