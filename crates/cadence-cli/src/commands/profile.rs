//! Timing profile commands.
//!
//! Shows the profiles the engine currently schedules with, after any
//! persisted retunes are applied.

use cadence_core::{find_pack, DayPart, TimingProfile};
use clap::Subcommand;

use super::state::load_engine;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List all personas with their base intervals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the full profile for a persona
    Show {
        /// Persona key (e.g., "manager", "analyst")
        persona: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::List { json } => list_profiles(json),
        ProfileAction::Show { persona, json } => show_profile(&persona, json),
    }
}

fn list_profiles(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;
    let personas = engine.personas();

    if json {
        let profiles: std::collections::BTreeMap<String, TimingProfile> = personas
            .iter()
            .map(|p| (p.clone(), engine.get_timing_profile(p)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    println!("Personas (default: {}):", engine.default_persona());
    println!();
    for persona in personas {
        let intervals = engine.get_timing_profile(&persona).base_interval_minutes;
        println!(
            "  {:<12} morning {:>6.1}  afternoon {:>6.1}  evening {:>6.1}",
            persona, intervals.morning, intervals.afternoon, intervals.evening
        );
    }
    Ok(())
}

fn show_profile(persona: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;
    let profile = engine.get_timing_profile(persona);

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    if !engine.personas().iter().any(|p| p == persona) {
        println!(
            "Unknown persona '{}', showing default '{}'",
            persona,
            engine.default_persona()
        );
        println!();
    }

    println!("Persona: {persona}");
    if let Some(pack) = find_pack(persona) {
        println!("  {} - {}", pack.name, pack.description);
    }
    println!();
    println!("Base intervals (minutes):");
    for part in DayPart::ALL {
        println!(
            "  {:<10} {:>6.1}",
            part.as_str(),
            profile.base_interval_minutes.get(part)
        );
    }

    let t = &profile.cognitive_load_thresholds;
    println!();
    println!("Cognitive load thresholds:");
    println!("  low {:.2}  medium {:.2}  high {:.2}", t.low, t.medium, t.high);

    let f = &profile.flow_protection;
    println!();
    println!("Flow protection:");
    println!("  detection threshold  {:.2}", f.detection_threshold);
    println!("  minimum protection   {:.0} min", f.minimum_protection_minutes);
    println!("  gradual re-entry     {}", f.gradual_reentry);

    if let Some(pack) = find_pack(persona) {
        println!();
        println!("Rationale:");
        for line in pack.rationale.lines() {
            println!("  {line}");
        }
    }

    Ok(())
}
