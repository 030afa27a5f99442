use crate::state::{clamp_prompt, BatchSpec, Notice, RunStatus, PROMPT_CHAR_LIMIT};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RefreshRequested => vec![Effect::LoadProjects],
        Msg::ProjectsLoaded(projects) => {
            state.set_projects(projects);
            Vec::new()
        }
        Msg::ProjectOpened(project_id) => {
            state.open_project(project_id.clone());
            vec![Effect::LoadRecords { project_id }]
        }
        Msg::ProjectClosed => {
            // Leaving the project releases its poll; the run does not outlive
            // the subject it renders against.
            let was_running = state.run_status() == RunStatus::Running;
            state.close_project();
            if was_running {
                vec![Effect::CancelPolling]
            } else {
                Vec::new()
            }
        }
        Msg::RecordsLoaded(records) => {
            state.set_records(records);
            Vec::new()
        }
        Msg::BatchRequested { spec } => {
            let Some(project_id) = state.selected().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            let spec = clamp_spec_prompt(spec);
            // Last-start-wins: arm the new run and cancel whatever was
            // polling before scheduling the start. No queuing.
            state.arm_run(spec.kind());
            vec![
                Effect::CancelPolling,
                Effect::StartBatch { project_id, spec },
            ]
        }
        Msg::BatchStartFailed { kind, message } => {
            if state.run_status() == RunStatus::Running && state.run_kind() == Some(kind) {
                state.fail_run(message);
            }
            Vec::new()
        }
        Msg::BatchSample {
            kind,
            processed,
            total,
            failed,
        } => {
            // Samples for a run that is no longer active are stale; drop them.
            if state.run_status() != RunStatus::Running || state.run_kind() != Some(kind) {
                return (state, Vec::new());
            }
            state.apply_sample(processed, total, failed);
            if total == 0 || processed >= total {
                state.complete_run(kind);
                let mut effects = vec![Effect::CancelPolling];
                if let Some(project_id) = state.selected().map(ToOwned::to_owned) {
                    // An empty batch has no per-item outcomes to fetch.
                    if total > 0 {
                        effects.push(Effect::FetchStatusRows {
                            kind,
                            project_id: project_id.clone(),
                        });
                    }
                    effects.push(Effect::LoadRecords { project_id });
                }
                effects
            } else {
                Vec::new()
            }
        }
        Msg::BatchSampleFailed { .. } => {
            // Transient; the poll engine already logged it and keeps ticking.
            Vec::new()
        }
        Msg::StatusRowsLoaded { kind, rows } => {
            if state.run_status() == RunStatus::Completed && state.run_kind() == Some(kind) {
                state.set_status_log(rows);
            }
            Vec::new()
        }
        Msg::LogDismissed => {
            state.dismiss_log();
            Vec::new()
        }
        Msg::CancelRequested => {
            if state.run_status() == RunStatus::Running {
                state.release_run();
            }
            vec![Effect::CancelPolling]
        }
        Msg::DeleteProjectRequested => {
            let Some(project_id) = state.selected().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            if state.run_status() == RunStatus::Running {
                state.release_run();
            }
            // Polling must be released before the subject disappears.
            vec![
                Effect::CancelPolling,
                Effect::DeleteProject { project_id },
            ]
        }
        Msg::ProjectDeleted => {
            state.project_deleted();
            vec![Effect::LoadProjects]
        }
        Msg::ProjectDeleteFailed { message } | Msg::RequestFailed { message } => {
            state.set_notice(Notice::error(message));
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn clamp_spec_prompt(spec: BatchSpec) -> BatchSpec {
    match spec {
        BatchSpec::Cleanup(mut options) => {
            if let Some(prompt) = options.project_prompt.take() {
                options.project_prompt = Some(if prompt.len() > PROMPT_CHAR_LIMIT {
                    clamp_prompt(&prompt).to_owned()
                } else {
                    prompt
                });
            }
            BatchSpec::Cleanup(options)
        }
        BatchSpec::Synthesis => BatchSpec::Synthesis,
    }
}
