use intervox_core::{
    update, AppState, BatchSpec, CleanupOptions, Effect, JobKind, Msg, RunStatus, StatusRow,
    PROMPT_CHAR_LIMIT,
};

fn open_project(state: AppState, project_id: &str) -> (AppState, Vec<Effect>) {
    update(state, Msg::ProjectOpened(project_id.to_string()))
}

fn request_cleanup(state: AppState) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::BatchRequested {
            spec: BatchSpec::Cleanup(CleanupOptions::default()),
        },
    )
}

fn sample(state: AppState, kind: JobKind, processed: u64, total: u64) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::BatchSample {
            kind,
            processed,
            total,
            failed: 0,
        },
    )
}

#[test]
fn batch_request_arms_run_and_cancels_before_start() {
    let (state, _) = open_project(AppState::new(), "P1");
    let (mut state, effects) = request_cleanup(state);

    let view = state.view();
    assert_eq!(view.run_status, RunStatus::Running);
    assert!(view.busy);
    assert_eq!(view.run_kind, Some(JobKind::Cleanup));
    assert_eq!((view.processed, view.total), (0, 0));
    assert!(state.consume_dirty());

    assert_eq!(
        effects,
        vec![
            Effect::CancelPolling,
            Effect::StartBatch {
                project_id: "P1".to_string(),
                spec: BatchSpec::Cleanup(CleanupOptions::default()),
            },
        ]
    );
}

#[test]
fn batch_request_without_selection_is_ignored() {
    let (mut state, effects) = request_cleanup(AppState::new());
    assert!(effects.is_empty());
    assert_eq!(state.view().run_status, RunStatus::Idle);
    assert!(!state.consume_dirty());
}

#[test]
fn cleanup_scenario_finalizes_once_with_rows_fetch() {
    let (state, _) = open_project(AppState::new(), "P1");
    let (state, _) = request_cleanup(state);

    // First sample: 0 of 5 processed, still running.
    let (state, effects) = sample(state, JobKind::Cleanup, 0, 5);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.run_status, RunStatus::Running);
    assert_eq!((view.processed, view.total), (0, 5));

    // Second sample reaches the total: run completes, poll released, rows
    // fetched and records reloaded.
    let (state, effects) = sample(state, JobKind::Cleanup, 5, 5);
    let view = state.view();
    assert_eq!(view.run_status, RunStatus::Completed);
    assert!(!view.busy);
    assert_eq!((view.processed, view.total), (5, 5));
    assert_eq!(
        view.notice.unwrap().text,
        JobKind::Cleanup.completion_notice()
    );
    assert_eq!(
        effects,
        vec![
            Effect::CancelPolling,
            Effect::FetchStatusRows {
                kind: JobKind::Cleanup,
                project_id: "P1".to_string(),
            },
            Effect::LoadRecords {
                project_id: "P1".to_string(),
            },
        ]
    );

    // A third terminal sample is stale and must not re-finalize.
    let (state, effects) = sample(state, JobKind::Cleanup, 5, 5);
    assert!(effects.is_empty());
    assert_eq!(state.view().run_status, RunStatus::Completed);
}

#[test]
fn empty_batch_completes_without_rows_fetch() {
    let (state, _) = open_project(AppState::new(), "P2");
    let (state, _) = update(
        state,
        Msg::BatchRequested {
            spec: BatchSpec::Synthesis,
        },
    );

    let (state, effects) = sample(state, JobKind::Synthesis, 0, 0);
    let view = state.view();
    assert_eq!(view.run_status, RunStatus::Completed);
    assert_eq!(
        effects,
        vec![
            Effect::CancelPolling,
            Effect::LoadRecords {
                project_id: "P2".to_string(),
            },
        ]
    );
}

#[test]
fn zero_total_finalizes_regardless_of_processed() {
    let (state, _) = open_project(AppState::new(), "P2");
    let (state, _) = update(
        state,
        Msg::BatchRequested {
            spec: BatchSpec::Synthesis,
        },
    );

    // A nonsense snapshot with processed > 0 but total == 0 still terminates.
    let (state, effects) = sample(state, JobKind::Synthesis, 3, 0);
    assert_eq!(state.view().run_status, RunStatus::Completed);
    assert!(effects.contains(&Effect::CancelPolling));
}

#[test]
fn sample_for_other_kind_is_dropped() {
    let (state, _) = open_project(AppState::new(), "P1");
    let (state, _) = request_cleanup(state);

    let (state, effects) = sample(state, JobKind::Synthesis, 4, 4);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.run_status, RunStatus::Running);
    assert_eq!((view.processed, view.total), (0, 0));
}

#[test]
fn count_regression_is_accepted_as_is() {
    let (state, _) = open_project(AppState::new(), "P1");
    let (state, _) = request_cleanup(state);
    let (state, _) = sample(state, JobKind::Cleanup, 3, 5);

    // An out-of-order response may regress; the latest snapshot wins.
    let (state, _) = sample(state, JobKind::Cleanup, 2, 5);
    let view = state.view();
    assert_eq!((view.processed, view.total), (2, 5));
    assert_eq!(view.run_status, RunStatus::Running);
}

#[test]
fn status_rows_shown_then_dismissed_resets_run() {
    let (state, _) = open_project(AppState::new(), "P1");
    let (state, _) = request_cleanup(state);
    let (state, _) = sample(state, JobKind::Cleanup, 2, 2);

    let rows = vec![
        StatusRow {
            num: 1,
            succeeded: true,
            error: None,
        },
        StatusRow {
            num: 2,
            succeeded: false,
            error: Some("synthesis backend unavailable".to_string()),
        },
    ];
    let (state, effects) = update(
        state,
        Msg::StatusRowsLoaded {
            kind: JobKind::Cleanup,
            rows: rows.clone(),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.show_log);
    assert_eq!(view.status_log, rows);

    let (state, _) = update(state, Msg::LogDismissed);
    let view = state.view();
    assert!(!view.show_log);
    assert!(view.status_log.is_empty());
    assert_eq!(view.run_status, RunStatus::Idle);
    assert_eq!((view.processed, view.total), (0, 0));
}

#[test]
fn status_rows_for_stale_run_are_dropped() {
    let (state, _) = open_project(AppState::new(), "P1");
    let (state, _) = request_cleanup(state);

    // Rows arriving while the run is still live belong to an older run.
    let (state, _) = update(
        state,
        Msg::StatusRowsLoaded {
            kind: JobKind::Cleanup,
            rows: vec![StatusRow {
                num: 1,
                succeeded: true,
                error: None,
            }],
        },
    );
    assert!(!state.view().show_log);
}

#[test]
fn project_prompt_is_clamped_to_budget() {
    let (state, _) = open_project(AppState::new(), "P1");
    let long_prompt = "p".repeat(PROMPT_CHAR_LIMIT + 50);
    let (_, effects) = update(
        state,
        Msg::BatchRequested {
            spec: BatchSpec::Cleanup(CleanupOptions {
                project_prompt: Some(long_prompt),
                ..CleanupOptions::default()
            }),
        },
    );

    let spec = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartBatch { spec, .. } => Some(spec.clone()),
            _ => None,
        })
        .expect("start effect");
    let BatchSpec::Cleanup(options) = spec else {
        panic!("cleanup spec expected");
    };
    assert_eq!(options.project_prompt.unwrap().len(), PROMPT_CHAR_LIMIT);
}
