//! Engine state persistence between CLI invocations.
//!
//! Each invocation rebuilds the engine from `config.toml` plus
//! `state.json` and writes the state back after mutating commands.

use std::path::PathBuf;

use cadence_core::{data_dir, EngineConfig, EngineState, SchedulingEngine};

pub fn state_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("state.json"))
}

pub fn outcomes_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("outcomes.jsonl"))
}

/// Load the engine with any persisted state applied.
pub fn load_engine() -> Result<SchedulingEngine, Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    let path = state_path()?;

    let state = match std::fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str::<EngineState>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no saved state, starting fresh");
            EngineState::default()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(SchedulingEngine::restore(config, state)?)
}

pub fn save_engine(engine: &SchedulingEngine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&engine.export_state())?;
    std::fs::write(state_path()?, json)?;
    Ok(())
}
