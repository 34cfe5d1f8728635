//! Seams to the systems around the core.
//!
//! The engine decides *when* and *what kind*; turning a category into text
//! and persisting outcomes belong to the host. These traits describe what
//! the host plugs in. The core itself never calls them: the host invokes a
//! generator after receiving a permitted `ScheduleDecision` and a sink
//! alongside `record_outcome`.

use std::io::Write;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::outcome::OutcomeRecord;
use crate::signal::SignalSnapshot;
use crate::strategy::InterventionCategory;

/// Produces intervention text for a category.
pub trait ContentGenerator: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    fn generate(&self, category: InterventionCategory, snapshot: &SignalSnapshot)
        -> Result<String>;
}

/// Persists outcome records outside the process.
pub trait OutcomeSink: Send + Sync {
    fn persist(&self, outcome: &OutcomeRecord) -> Result<()>;

    /// Flush buffered records. Default no-op.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Fixed message per category with the persona substituted in.
#[derive(Debug, Clone, Default)]
pub struct TemplateContentGenerator;

impl TemplateContentGenerator {
    fn template(category: InterventionCategory) -> &'static str {
        match category {
            InterventionCategory::Focus => {
                "You're carrying a heavy load. Take five minutes away from the screen, then pick the one thing that matters most."
            }
            InterventionCategory::Motivation => {
                "Progress has slowed. What's the smallest next step you could finish in ten minutes?"
            }
            InterventionCategory::Habit => {
                "You've been pulled away often. Consider blocking notifications for your next {persona} work block."
            }
            InterventionCategory::Maintenance => {
                "Quick check-in: how is your {persona} work going?"
            }
        }
    }
}

impl ContentGenerator for TemplateContentGenerator {
    fn name(&self) -> &str {
        "template"
    }

    fn generate(
        &self,
        category: InterventionCategory,
        snapshot: &SignalSnapshot,
    ) -> Result<String> {
        Ok(Self::template(category).replace("{persona}", snapshot.persona()))
    }
}

/// Writes each outcome as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> OutcomeSink for JsonLinesSink<W> {
    fn persist(&self, outcome: &OutcomeRecord) -> Result<()> {
        let line = serde_json::to_string(outcome)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}").map_err(CoreError::from)
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush().map_err(CoreError::from)
    }
}
