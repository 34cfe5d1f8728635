pub mod adaptations;
pub mod config;
pub mod evaluate;
pub mod outcome;
pub mod profile;
pub mod prune;
pub mod simulate;
pub mod state;
pub mod stats;
