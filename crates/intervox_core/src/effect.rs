use crate::state::{BatchSpec, JobKind};

/// Side effects requested by `update`, executed by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadProjects,
    LoadRecords { project_id: String },
    /// Start a batch run and begin sampling its progress.
    StartBatch { project_id: String, spec: BatchSpec },
    /// Release the polling resource. Safe to execute when none is live.
    CancelPolling,
    /// One-shot fetch of the terminal per-item log.
    FetchStatusRows { kind: JobKind, project_id: String },
    DeleteProject { project_id: String },
}
