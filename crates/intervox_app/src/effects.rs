use std::sync::{mpsc, Arc};
use std::thread;

use client_logging::{client_error, client_info};
use intervox_client::{
    ApiError, BackendApi, BackendEvent, BackendHandle, BatchRequest, CleanupRequest,
    ClientSettings, HttpBackend, PollSettings,
};
use intervox_core::{BatchSpec, Effect, JobKind, Msg, ProjectSummary, RecordSnapshot, StatusRow};

/// Executes core effects against the backend engine and feeds engine events
/// back into the shell as messages.
pub struct EffectRunner {
    handle: BackendHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings, msg_tx: mpsc::Sender<Msg>) -> Result<Self, ApiError> {
        let api: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(&settings)?);
        let (handle, event_rx) = BackendHandle::new(api, PollSettings::default());
        spawn_event_loop(event_rx, msg_tx);
        Ok(Self { handle })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadProjects => self.handle.load_projects(),
                Effect::LoadRecords { project_id } => self.handle.load_records(project_id),
                Effect::StartBatch { project_id, spec } => {
                    client_info!("starting {} batch for {}", map_kind(spec.kind()), project_id);
                    self.handle.start_batch(project_id, map_spec(spec));
                }
                Effect::CancelPolling => self.handle.cancel_polling(),
                Effect::FetchStatusRows { kind, project_id } => {
                    self.handle.fetch_status_rows(map_kind(kind), project_id);
                }
                Effect::DeleteProject { project_id } => self.handle.delete_project(project_id),
            }
        }
    }
}

fn spawn_event_loop(event_rx: mpsc::Receiver<BackendEvent>, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            if msg_tx.send(map_event(event)).is_err() {
                break;
            }
        }
    });
}

fn map_event(event: BackendEvent) -> Msg {
    match event {
        BackendEvent::ProjectsLoaded(Ok(projects)) => {
            Msg::ProjectsLoaded(projects.into_iter().map(map_project).collect())
        }
        BackendEvent::ProjectsLoaded(Err(error)) => {
            client_error!("failed to load projects: {error}");
            Msg::RequestFailed {
                message: format!("failed to load projects: {error}"),
            }
        }
        BackendEvent::RecordsLoaded { project_id, result } => match result {
            Ok(records) => Msg::RecordsLoaded(records.into_iter().map(map_record).collect()),
            Err(error) => {
                client_error!("failed to load records for {project_id}: {error}");
                Msg::RequestFailed {
                    message: format!("failed to load records for {project_id}: {error}"),
                }
            }
        },
        BackendEvent::BatchStartFailed { kind, error } => Msg::BatchStartFailed {
            kind: map_kind_back(kind),
            message: error.to_string(),
        },
        BackendEvent::BatchSample { kind, progress } => Msg::BatchSample {
            kind: map_kind_back(kind),
            processed: progress.processed,
            total: progress.total,
            failed: progress.failed,
        },
        BackendEvent::BatchSampleFailed { kind, error } => Msg::BatchSampleFailed {
            kind: map_kind_back(kind),
            message: error.to_string(),
        },
        BackendEvent::StatusRows { kind, result } => match result {
            Ok(rows) => Msg::StatusRowsLoaded {
                kind: map_kind_back(kind),
                rows: rows.into_iter().map(map_row).collect(),
            },
            Err(error) => {
                // The run already completed on authoritative counts; a lost
                // detail log only means there is nothing extra to show.
                client_error!("failed to fetch status rows: {error}");
                Msg::NoOp
            }
        },
        BackendEvent::ProjectDeleted { project_id, result } => match result {
            Ok(()) => Msg::ProjectDeleted,
            Err(error) => {
                client_error!("failed to delete project {project_id}: {error}");
                Msg::ProjectDeleteFailed {
                    message: format!("failed to delete project {project_id}: {error}"),
                }
            }
        },
    }
}

fn map_kind(kind: JobKind) -> intervox_client::JobKind {
    match kind {
        JobKind::Cleanup => intervox_client::JobKind::Cleanup,
        JobKind::Synthesis => intervox_client::JobKind::Synthesis,
    }
}

fn map_kind_back(kind: intervox_client::JobKind) -> JobKind {
    match kind {
        intervox_client::JobKind::Cleanup => JobKind::Cleanup,
        intervox_client::JobKind::Synthesis => JobKind::Synthesis,
    }
}

fn map_spec(spec: BatchSpec) -> BatchRequest {
    match spec {
        BatchSpec::Cleanup(options) => BatchRequest::Cleanup(CleanupRequest {
            overwrite_texts: options.overwrite_texts,
            overwrite_prompts: options.overwrite_prompts,
            project_prompt: options.project_prompt,
        }),
        BatchSpec::Synthesis => BatchRequest::Synthesis,
    }
}

fn map_project(project: intervox_client::ProjectSummary) -> ProjectSummary {
    ProjectSummary {
        id: project.id,
        title: project.title,
        desc: project.desc,
    }
}

fn map_record(record: intervox_client::RecordRow) -> RecordSnapshot {
    RecordSnapshot {
        num: record.num,
        question: record.question,
        answer: record.answer,
        intonation_q: record.intonation_q,
        intonation_a: record.intonation_a,
        notes: record.notes,
    }
}

fn map_row(row: intervox_client::StatusRow) -> StatusRow {
    StatusRow {
        num: row.num,
        succeeded: row.succeeded,
        error: row.error,
    }
}
