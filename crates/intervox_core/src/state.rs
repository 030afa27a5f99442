use std::collections::BTreeMap;

use crate::view_model::AppViewModel;

/// Character budget for the free-form project prompt sent with a cleanup run.
pub const PROMPT_CHAR_LIMIT: usize = 600;

pub type RecordNum = u32;

/// The two batch job families the backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Bulk LLM text cleanup plus intonation annotation.
    Cleanup,
    /// Bulk text-to-speech synthesis.
    Synthesis,
}

impl JobKind {
    /// User-facing notice raised when a run of this kind completes.
    pub fn completion_notice(self) -> &'static str {
        match self {
            JobKind::Cleanup => "Cleaned texts and intonation annotations generated",
            JobKind::Synthesis => "Audio generated for all records",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Caller-supplied options for a cleanup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    pub overwrite_texts: bool,
    pub overwrite_prompts: bool,
    pub project_prompt: Option<String>,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            overwrite_texts: true,
            overwrite_prompts: true,
            project_prompt: None,
        }
    }
}

/// What to start: a job kind together with its start-request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSpec {
    Cleanup(CleanupOptions),
    Synthesis,
}

impl BatchSpec {
    pub fn kind(&self) -> JobKind {
        match self {
            BatchSpec::Cleanup(_) => JobKind::Cleanup,
            BatchSpec::Synthesis => JobKind::Synthesis,
        }
    }
}

/// Clamp a project prompt to `PROMPT_CHAR_LIMIT` bytes on a char boundary.
pub fn clamp_prompt(text: &str) -> &str {
    if text.len() <= PROMPT_CHAR_LIMIT {
        return text;
    }
    let mut end = PROMPT_CHAR_LIMIT;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Per-item outcome fetched once after a run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub num: RecordNum,
    pub succeeded: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub desc: String,
}

/// One interview record as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSnapshot {
    pub num: RecordNum,
    pub question: String,
    pub answer: String,
    pub intonation_q: Option<String>,
    pub intonation_a: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Error,
}

/// The single toast-like user-facing message slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub severity: NoticeSeverity,
}

impl Notice {
    pub(crate) fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: NoticeSeverity::Info,
        }
    }

    pub(crate) fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: NoticeSeverity::Error,
        }
    }
}

/// One active or finished batch run. Counters always reset on arm; the kind
/// marker survives into terminal states until dismissal or the next arm.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct BatchRun {
    kind: Option<JobKind>,
    status: RunStatus,
    processed: u64,
    total: u64,
    failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    projects: Vec<ProjectSummary>,
    selected: Option<String>,
    records: BTreeMap<RecordNum, RecordSnapshot>,
    run: BatchRun,
    status_log: Vec<StatusRow>,
    show_log: bool,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            projects: self.projects.clone(),
            selected: self.selected.clone(),
            records: self.records.values().cloned().collect(),
            busy: self.run.status == RunStatus::Running,
            run_kind: self.run.kind,
            run_status: self.run.status,
            processed: self.run.processed,
            total: self.run.total,
            failed: self.run.failed,
            status_log: self.status_log.clone(),
            show_log: self.show_log,
            notice: self.notice.clone(),
            prompt_char_limit: PROMPT_CHAR_LIMIT,
            dirty: self.dirty,
        }
    }

    /// Returns the dirty flag and clears it. Rendering is gated on this.
    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    pub(crate) fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub(crate) fn run_status(&self) -> RunStatus {
        self.run.status
    }

    pub(crate) fn run_kind(&self) -> Option<JobKind> {
        self.run.kind
    }

    pub(crate) fn set_projects(&mut self, projects: Vec<ProjectSummary>) {
        self.projects = projects;
        self.dirty = true;
    }

    pub(crate) fn open_project(&mut self, project_id: String) {
        self.selected = Some(project_id);
        self.records.clear();
        self.dirty = true;
    }

    pub(crate) fn close_project(&mut self) {
        self.selected = None;
        self.records.clear();
        self.run = BatchRun::default();
        self.status_log.clear();
        self.show_log = false;
        self.dirty = true;
    }

    pub(crate) fn set_records(&mut self, records: Vec<RecordSnapshot>) {
        self.records = records.into_iter().map(|r| (r.num, r)).collect();
        self.dirty = true;
    }

    /// Begin a fresh run: counters zeroed, prior status log discarded.
    pub(crate) fn arm_run(&mut self, kind: JobKind) {
        self.run = BatchRun {
            kind: Some(kind),
            status: RunStatus::Running,
            processed: 0,
            total: 0,
            failed: 0,
        };
        self.status_log.clear();
        self.show_log = false;
        self.notice = None;
        self.dirty = true;
    }

    pub(crate) fn fail_run(&mut self, message: String) {
        self.run.status = RunStatus::Failed;
        self.notice = Some(Notice::error(message));
        self.dirty = true;
    }

    /// Overwrite counters with the latest server snapshot. The server value is
    /// authoritative; no field-by-field merge, no monotonicity assertion.
    pub(crate) fn apply_sample(&mut self, processed: u64, total: u64, failed: u64) {
        self.run.processed = processed;
        self.run.total = total;
        self.run.failed = failed;
        self.dirty = true;
    }

    pub(crate) fn complete_run(&mut self, kind: JobKind) {
        self.run.status = RunStatus::Completed;
        self.notice = Some(Notice::info(kind.completion_notice()));
        self.dirty = true;
    }

    /// Release a run back to idle. Counters keep their last observed values.
    pub(crate) fn release_run(&mut self) {
        self.run.status = RunStatus::Idle;
        self.run.kind = None;
        self.dirty = true;
    }

    pub(crate) fn set_status_log(&mut self, rows: Vec<StatusRow>) {
        self.status_log = rows;
        self.show_log = true;
        self.dirty = true;
    }

    /// Dismiss the status log; a terminal run is discarded with it.
    pub(crate) fn dismiss_log(&mut self) {
        self.show_log = false;
        self.status_log.clear();
        if self.run.status.is_terminal() {
            self.run = BatchRun::default();
        }
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.dirty = true;
    }

    pub(crate) fn project_deleted(&mut self) {
        self.selected = None;
        self.records.clear();
        self.run = BatchRun::default();
        self.status_log.clear();
        self.show_log = false;
        self.notice = Some(Notice::info("Project deleted"));
        self.dirty = true;
    }
}
