use std::collections::HashMap;
use std::sync::Arc;

use crate::executor::types::StepId;

/// Append-only mapping of step id -> output text for one run.
///
/// Values are shared `Arc<str>` so a wave can take a cheap snapshot; an entry
/// is never replaced once written.
#[derive(Debug, Clone, Default)]
pub struct OutputStore {
    entries: HashMap<StepId, Arc<str>>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step's output. Returns `false` (and keeps the first value) if
    /// the id was already written.
    pub fn record(&mut self, step_id: StepId, output: &str) -> bool {
        if self.entries.contains_key(&step_id) {
            tracing::warn!(step_id, "output already recorded; keeping first value");
            return false;
        }
        self.entries.insert(step_id, Arc::from(output));
        true
    }

    pub fn get(&self, step_id: StepId) -> Option<&str> {
        self.entries.get(&step_id).map(|v| v.as_ref())
    }

    pub fn contains(&self, step_id: StepId) -> bool {
        self.entries.contains_key(&step_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Join the outputs of `deps` present in the store, in the given order,
    /// separated by a blank line.
    pub fn aggregate(&self, deps: &[StepId]) -> String {
        deps.iter()
            .filter_map(|dep| self.get(*dep))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
