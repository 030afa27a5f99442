//! Intervox core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    clamp_prompt, AppState, BatchSpec, CleanupOptions, JobKind, Notice, NoticeSeverity,
    ProjectSummary, RecordNum, RecordSnapshot, RunStatus, StatusRow, PROMPT_CHAR_LIMIT,
};
pub use update::update;
pub use view_model::AppViewModel;
