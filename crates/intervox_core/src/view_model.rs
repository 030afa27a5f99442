use crate::state::{JobKind, Notice, ProjectSummary, RecordSnapshot, RunStatus, StatusRow};

/// Immutable render snapshot derived from `AppState`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub projects: Vec<ProjectSummary>,
    pub selected: Option<String>,
    pub records: Vec<RecordSnapshot>,
    /// True while a batch run is live; gates the action surface.
    pub busy: bool,
    /// Kind marker of the current run; survives into terminal states until
    /// dismissal or the next start.
    pub run_kind: Option<JobKind>,
    pub run_status: RunStatus,
    pub processed: u64,
    pub total: u64,
    pub failed: u64,
    pub status_log: Vec<StatusRow>,
    pub show_log: bool,
    pub notice: Option<Notice>,
    pub prompt_char_limit: usize,
    pub dirty: bool,
}
