use serde::{Deserialize, Serialize};

use super::plan::{Plan, StepId, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// Outcome of one step, produced exactly once after its tool call finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: StepId,
    pub tool_kind: ToolKind,
    pub status: StepStatus,

    /// Empty on error.
    #[serde(default)]
    pub output: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    pub duration_ms: u64,
}

impl StepResult {
    pub fn success(
        step_id: StepId,
        tool_kind: ToolKind,
        output: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            step_id,
            tool_kind,
            status: StepStatus::Success,
            output: output.into(),
            error_detail: None,
            duration_ms,
        }
    }

    pub fn error(
        step_id: StepId,
        tool_kind: ToolKind,
        detail: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            step_id,
            tool_kind,
            status: StepStatus::Error,
            output: String::new(),
            error_detail: Some(detail.into()),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Result of executing a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: String,

    pub plan: Plan,

    /// One entry per executed step, wave by wave, ids ascending within a wave.
    pub results: Vec<StepResult>,

    /// Waves in execution order; ids sorted ascending within a wave.
    pub waves: Vec<Vec<StepId>>,

    /// Steps left unexecuted because no progress was possible.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreached: Vec<StepId>,

    pub final_text_artifact: Option<String>,

    #[serde(default, with = "base64_bytes")]
    pub final_binary_artifact: Option<Vec<u8>>,

    /// Total wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn result_for(&self, step_id: StepId) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step_id == step_id)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// True when the scheduler stopped with steps still pending.
    pub fn deadlocked(&self) -> bool {
        !self.unreached.is_empty()
    }

    /// Index of the wave that ran `step_id`.
    pub fn wave_of(&self, step_id: StepId) -> Option<usize> {
        self.waves.iter().position(|w| w.contains(&step_id))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| STANDARD.decode(s.as_bytes()))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
