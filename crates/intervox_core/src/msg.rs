use crate::state::{BatchSpec, JobKind, ProjectSummary, RecordSnapshot, StatusRow};

/// Inputs folded into the state machine by the shell event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Ask the backend for the current project list.
    RefreshRequested,
    ProjectsLoaded(Vec<ProjectSummary>),
    /// User opened a project; its records are (re)loaded.
    ProjectOpened(String),
    /// User navigated back to the project list.
    ProjectClosed,
    RecordsLoaded(Vec<RecordSnapshot>),
    /// User triggered a batch run against the selected project.
    BatchRequested { spec: BatchSpec },
    /// The start request itself failed; no polling was scheduled.
    BatchStartFailed { kind: JobKind, message: String },
    /// One progress sample from the poll engine.
    BatchSample {
        kind: JobKind,
        processed: u64,
        total: u64,
        failed: u64,
    },
    /// A single sample request failed; the run keeps polling.
    BatchSampleFailed { kind: JobKind, message: String },
    /// Terminal per-item log fetched after completion.
    StatusRowsLoaded { kind: JobKind, rows: Vec<StatusRow> },
    LogDismissed,
    /// User cancelled the active run.
    CancelRequested,
    DeleteProjectRequested,
    ProjectDeleted,
    ProjectDeleteFailed { message: String },
    /// A collaborator request failed outside a batch run.
    RequestFailed { message: String },
    /// Render heartbeat.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
