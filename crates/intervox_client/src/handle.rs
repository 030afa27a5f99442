use std::sync::{mpsc, Arc};
use std::thread;

use tokio_util::sync::CancellationToken;

use crate::api::BackendApi;
use crate::poller::{run_poll, PollSettings};
use crate::types::{
    ApiError, BatchProgress, BatchRequest, JobKind, ProjectSummary, RecordRow, StatusRow,
};

#[derive(Debug)]
enum BackendCommand {
    LoadProjects,
    LoadRecords { project_id: String },
    StartBatch { project_id: String, request: BatchRequest },
    CancelPolling,
    FetchStatusRows { kind: JobKind, project_id: String },
    DeleteProject { project_id: String },
}

/// Outputs of the engine, drained by the shell event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    ProjectsLoaded(Result<Vec<ProjectSummary>, ApiError>),
    RecordsLoaded {
        project_id: String,
        result: Result<Vec<RecordRow>, ApiError>,
    },
    /// The start request failed; no sampling was scheduled for this run.
    BatchStartFailed { kind: JobKind, error: ApiError },
    BatchSample {
        kind: JobKind,
        progress: BatchProgress,
    },
    BatchSampleFailed { kind: JobKind, error: ApiError },
    StatusRows {
        kind: JobKind,
        result: Result<Vec<StatusRow>, ApiError>,
    },
    ProjectDeleted {
        project_id: String,
        result: Result<(), ApiError>,
    },
}

/// Where engine tasks deliver their events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BackendEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<BackendEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<BackendEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: BackendEvent) {
        let _ = self.tx.send(event);
    }
}

/// Command side of the engine. Owns nothing directly; the command thread owns
/// the tokio runtime and the single polling slot.
#[derive(Clone)]
pub struct BackendHandle {
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl BackendHandle {
    /// Spawn the engine and return the handle plus the event stream.
    pub fn new(
        api: Arc<dyn BackendApi>,
        settings: PollSettings,
    ) -> (Self, mpsc::Receiver<BackendEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::spawn(move || command_loop(api, settings, cmd_rx, sink));

        (Self { cmd_tx }, event_rx)
    }

    pub fn load_projects(&self) {
        let _ = self.cmd_tx.send(BackendCommand::LoadProjects);
    }

    pub fn load_records(&self, project_id: impl Into<String>) {
        let _ = self.cmd_tx.send(BackendCommand::LoadRecords {
            project_id: project_id.into(),
        });
    }

    /// Start a batch run. Any live poll is released first; last start wins.
    pub fn start_batch(&self, project_id: impl Into<String>, request: BatchRequest) {
        let _ = self.cmd_tx.send(BackendCommand::StartBatch {
            project_id: project_id.into(),
            request,
        });
    }

    /// Release the polling slot. A no-op when nothing is polling.
    pub fn cancel_polling(&self) {
        let _ = self.cmd_tx.send(BackendCommand::CancelPolling);
    }

    pub fn fetch_status_rows(&self, kind: JobKind, project_id: impl Into<String>) {
        let _ = self.cmd_tx.send(BackendCommand::FetchStatusRows {
            kind,
            project_id: project_id.into(),
        });
    }

    pub fn delete_project(&self, project_id: impl Into<String>) {
        let _ = self.cmd_tx.send(BackendCommand::DeleteProject {
            project_id: project_id.into(),
        });
    }
}

fn command_loop(
    api: Arc<dyn BackendApi>,
    settings: PollSettings,
    cmd_rx: mpsc::Receiver<BackendCommand>,
    sink: Arc<dyn EventSink>,
) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    // The single polling slot. Exactly one token may be live at a time;
    // installing a new one releases the previous poll first.
    let mut active: Option<CancellationToken> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            BackendCommand::StartBatch {
                project_id,
                request,
            } => {
                release_poll(&mut active);
                let token = CancellationToken::new();
                active = Some(token.clone());
                runtime.spawn(run_poll(
                    api.clone(),
                    project_id,
                    request,
                    settings.clone(),
                    token,
                    sink.clone(),
                ));
            }
            BackendCommand::CancelPolling => release_poll(&mut active),
            BackendCommand::LoadProjects => {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    sink.emit(BackendEvent::ProjectsLoaded(api.list_projects().await));
                });
            }
            BackendCommand::LoadRecords { project_id } => {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    let result = api.list_records(&project_id).await;
                    sink.emit(BackendEvent::RecordsLoaded { project_id, result });
                });
            }
            BackendCommand::FetchStatusRows { kind, project_id } => {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    let result = api.status_rows(kind, &project_id).await;
                    sink.emit(BackendEvent::StatusRows { kind, result });
                });
            }
            BackendCommand::DeleteProject { project_id } => {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    let result = api.delete_project(&project_id).await;
                    sink.emit(BackendEvent::ProjectDeleted { project_id, result });
                });
            }
        }
    }

    // Owner dropped the handle: release the poll before the runtime goes down.
    release_poll(&mut active);
}

/// Idempotent release: cancelling an empty slot is a no-op, never an error.
fn release_poll(active: &mut Option<CancellationToken>) {
    if let Some(token) = active.take() {
        token.cancel();
    }
}
