use serde::{Deserialize, Serialize};
use std::fmt;

pub type RecordNum = u32;

/// The two batch job families, routed to different endpoint groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Cleanup,
    Synthesis,
}

impl JobKind {
    /// Path segment naming this job family on the backend.
    pub(crate) fn route(self) -> &'static str {
        match self {
            JobKind::Cleanup => "llm",
            JobKind::Synthesis => "tts",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Cleanup => write!(f, "cleanup"),
            JobKind::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// One progress snapshot for an active batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchProgress {
    pub processed: u64,
    pub total: u64,
    /// Present only while a per-run status ledger exists server-side.
    #[serde(default)]
    pub failed: u64,
}

/// Per-item outcome from the terminal status log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusRow {
    pub num: RecordNum,
    pub succeeded: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct StatusRowsBody {
    pub rows: Vec<StatusRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
}

/// Project-level defaults stored next to the records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewer_voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewee_voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct CreatedProject {
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordRow {
    pub num: RecordNum,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub intonation_q: Option<String>,
    #[serde(default)]
    pub intonation_a: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for one record; absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intonation_q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intonation_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Start-request payload for a bulk cleanup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupRequest {
    pub overwrite_texts: bool,
    pub overwrite_prompts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_prompt: Option<String>,
}

/// A batch start request; synthesis takes no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRequest {
    Cleanup(CleanupRequest),
    Synthesis,
}

impl BatchRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            BatchRequest::Cleanup(_) => JobKind::Cleanup,
            BatchRequest::Synthesis => JobKind::Synthesis,
        }
    }
}

/// Which half of a record an audio file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioPart {
    Question,
    Answer,
}

impl AudioPart {
    pub(crate) fn route(self) -> &'static str {
        match self {
            AudioPart::Question => "question",
            AudioPart::Answer => "answer",
        }
    }
}

/// Single-item resynthesis with an optional intonation override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    pub part: AudioPart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intonation: Option<String>,
}

/// Result of a PDF ingestion upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub project_id: String,
    #[serde(default)]
    pub records: u64,
}

/// Classified failure for one backend request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("backend returned http status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response body: {0}")]
    Decode(String),
}
