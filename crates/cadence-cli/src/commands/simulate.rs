//! Simulation command.
//!
//! Runs against a fresh engine built from the configuration; persisted
//! state is neither read nor written.

use cadence_core::{EngineConfig, SchedulingEngine, SimulationConfig, WorkdaySimulator};
use clap::Args;

#[derive(Args)]
pub struct SimulateArgs {
    /// Simulated workdays
    #[arg(long, default_value_t = 5)]
    pub days: u32,

    /// Synthetic users per persona
    #[arg(long, default_value_t = 3)]
    pub users_per_persona: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Personas to simulate (defaults to every configured persona)
    #[arg(long, value_delimiter = ',')]
    pub personas: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = SchedulingEngine::new(EngineConfig::load()?)?;
    let personas = if args.personas.is_empty() {
        engine.personas()
    } else {
        args.personas
    };

    let simulator = WorkdaySimulator::with_config(SimulationConfig {
        days: args.days,
        users_per_persona: args.users_per_persona,
        seed: Some(args.seed),
        ..SimulationConfig::default()
    });
    let report = simulator.run(&engine, &personas);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Simulation ({} days, seed {}):", args.days, args.seed);
    println!("  Evaluations:     {}", report.evaluations);
    println!("  Offered:         {}", report.offered);
    println!("  Accepted:        {}", report.accepted);
    println!("  Acceptance rate: {:.1}%", report.acceptance_rate * 100.0);
    println!("  Flow protected:  {}", report.flow_protected);
    println!("  Retunes:         {}", report.retunes);
    println!();
    println!("  persona       offered  accepted  morning  afternoon");
    for (persona, row) in &report.personas {
        println!(
            "  {:<12}  {:>7}  {:>8}  {:>7.1}  {:>9.1}",
            persona,
            row.offered,
            row.accepted,
            row.final_intervals.morning,
            row.final_intervals.afternoon
        );
    }
    Ok(())
}
