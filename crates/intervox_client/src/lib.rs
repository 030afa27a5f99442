//! Intervox client: backend API surface and the batch poll engine.
mod api;
mod handle;
mod poller;
mod types;

pub use api::{BackendApi, ClientSettings, HttpBackend};
pub use handle::{BackendEvent, BackendHandle, ChannelEventSink, EventSink};
pub use poller::PollSettings;
pub use types::{
    ApiError, AudioPart, BatchProgress, BatchRequest, CleanupRequest, JobKind, ProjectInfo,
    ProjectSummary, RecordNum, RecordPatch, RecordRow, StatusRow, SynthesisRequest, UploadReceipt,
};
