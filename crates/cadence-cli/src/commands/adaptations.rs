use clap::Args;

use super::state::load_engine;

#[derive(Args)]
pub struct AdaptationsArgs {
    /// Only show retunes for this persona
    #[arg(long)]
    pub persona: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AdaptationsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;
    let events: Vec<_> = engine
        .adaptation_log()
        .into_iter()
        .filter(|e| args.persona.as_ref().map_or(true, |p| &e.persona == p))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No retunes applied");
        return Ok(());
    }

    for event in events {
        println!(
            "{}  {:<10} hour {:>2}  {:?}  morning {:.1} -> {:.1}  afternoon {:.1} -> {:.1}{}",
            event.at.format("%Y-%m-%d %H:%M:%S"),
            event.persona,
            event.hour_of_day,
            event.direction,
            event.before.morning,
            event.after.morning,
            event.before.afternoon,
            event.after.afternoon,
            if event.clamped { " (clamped)" } else { "" }
        );
    }
    Ok(())
}
