use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use client_logging::{client_debug, set_poll_tick};
use intervox_client::ClientSettings;
use intervox_core::{
    update, AppState, AppViewModel, BatchSpec, CleanupOptions, JobKind, Msg, NoticeSeverity,
    RunStatus,
};

use crate::cli::Command;
use crate::effects::EffectRunner;
use crate::persistence::{self, RunRecord};

const DRAIN_TIMEOUT: Duration = Duration::from_millis(50);
const TICK_INTERVAL: Duration = Duration::from_millis(250);
/// How long to wait for the status log after completion before giving up on it.
const LOG_GRACE: Duration = Duration::from_secs(5);

pub fn print_history() -> i32 {
    let runs = persistence::load_history(&working_dir());
    if runs.is_empty() {
        println!("No finished runs recorded here yet.");
        return 0;
    }
    for run in runs {
        println!(
            "{}  {:<9}  {}  {}/{} processed, {} failed",
            run.finished_at, run.kind, run.project_id, run.processed, run.total, run.failed
        );
    }
    0
}

pub fn run(command: Command, base_url: &str) -> i32 {
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let settings = ClientSettings {
        base_url: base_url.to_string(),
        ..ClientSettings::default()
    };
    let effects = match EffectRunner::new(settings, msg_tx.clone()) {
        Ok(runner) => runner,
        Err(error) => {
            eprintln!("invalid backend configuration: {error}");
            return 2;
        }
    };

    // Heartbeat for render throttling and poll-tick log correlation.
    let tick_tx = msg_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(Msg::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    for msg in initial_msgs(&command) {
        let _ = msg_tx.send(msg);
    }

    let mut state = AppState::new();
    let mut tracker = Tracker::new(command);
    let mut renderer = Renderer::default();
    let mut tick_count: u64 = 0;

    loop {
        let msg = match msg_rx.recv_timeout(DRAIN_TIMEOUT) {
            Ok(msg) => msg,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return 1,
        };

        if msg == Msg::Tick {
            tick_count += 1;
            set_poll_tick(tick_count);
        }
        tracker.observe(&msg);

        let (next, new_effects) = update(std::mem::take(&mut state), msg);
        state = next;
        effects.enqueue(new_effects);

        if state.consume_dirty() {
            renderer.render(&state.view());
        }

        if let Some(code) = tracker.outcome(&state.view()) {
            return code;
        }
    }
}

fn initial_msgs(command: &Command) -> Vec<Msg> {
    match command {
        Command::Projects => vec![Msg::RefreshRequested],
        Command::Records { project_id } => vec![Msg::ProjectOpened(project_id.clone())],
        Command::Clean {
            project_id,
            prompt,
            keep_texts,
            keep_prompts,
        } => vec![
            Msg::ProjectOpened(project_id.clone()),
            Msg::BatchRequested {
                spec: BatchSpec::Cleanup(CleanupOptions {
                    overwrite_texts: !keep_texts,
                    overwrite_prompts: !keep_prompts,
                    project_prompt: prompt.clone(),
                }),
            },
        ],
        Command::Synthesize { project_id } => vec![
            Msg::ProjectOpened(project_id.clone()),
            Msg::BatchRequested {
                spec: BatchSpec::Synthesis,
            },
        ],
        Command::Delete { project_id } => vec![
            Msg::ProjectOpened(project_id.clone()),
            Msg::DeleteProjectRequested,
        ],
        Command::History => Vec::new(),
    }
}

/// Decides when the one-shot command is finished and with which exit code.
struct Tracker {
    command: Command,
    projects_loaded: bool,
    records_loaded: bool,
    deleted: bool,
    delete_failed: bool,
    request_failed: bool,
    completed_at: Option<Instant>,
    history_saved: bool,
}

impl Tracker {
    fn new(command: Command) -> Self {
        Self {
            command,
            projects_loaded: false,
            records_loaded: false,
            deleted: false,
            delete_failed: false,
            request_failed: false,
            completed_at: None,
            history_saved: false,
        }
    }

    fn observe(&mut self, msg: &Msg) {
        match msg {
            Msg::ProjectsLoaded(_) => self.projects_loaded = true,
            Msg::RecordsLoaded(_) => self.records_loaded = true,
            Msg::ProjectDeleted => self.deleted = true,
            Msg::ProjectDeleteFailed { .. } => self.delete_failed = true,
            Msg::RequestFailed { .. } => self.request_failed = true,
            _ => {}
        }
    }

    fn outcome(&mut self, view: &AppViewModel) -> Option<i32> {
        match self.command {
            Command::Projects => {
                if self.projects_loaded {
                    Some(0)
                } else if self.request_failed {
                    Some(1)
                } else {
                    None
                }
            }
            Command::Records { .. } => {
                if self.records_loaded {
                    Some(0)
                } else if self.request_failed {
                    Some(1)
                } else {
                    None
                }
            }
            Command::Delete { .. } => {
                if self.deleted {
                    Some(0)
                } else if self.delete_failed {
                    Some(1)
                } else {
                    None
                }
            }
            Command::Clean { .. } | Command::Synthesize { .. } => self.batch_outcome(view),
            Command::History => Some(0),
        }
    }

    fn batch_outcome(&mut self, view: &AppViewModel) -> Option<i32> {
        match view.run_status {
            RunStatus::Failed => Some(1),
            RunStatus::Completed => {
                let completed_at = *self.completed_at.get_or_insert_with(Instant::now);
                if !self.history_saved {
                    self.history_saved = true;
                    save_history(view);
                }
                // An empty batch fetches no rows; otherwise wait for the log
                // a little while before exiting without it.
                let log_ready = view.show_log || view.total == 0;
                if log_ready || completed_at.elapsed() >= LOG_GRACE {
                    Some(0)
                } else {
                    None
                }
            }
            RunStatus::Idle | RunStatus::Running => None,
        }
    }
}

/// Prints each part of the view once, as it becomes available.
#[derive(Default)]
struct Renderer {
    printed_projects: bool,
    printed_records: bool,
    printed_log: bool,
    last_progress: Option<(u64, u64, u64)>,
    last_notice: Option<String>,
}

impl Renderer {
    fn render(&mut self, view: &AppViewModel) {
        if !view.projects.is_empty() && !self.printed_projects {
            self.printed_projects = true;
            for project in &view.projects {
                println!("{:<12} {:<32} {}", project.id, project.title, project.desc);
            }
        }

        if !view.records.is_empty() && !self.printed_records {
            self.printed_records = true;
            println!("{} records:", view.records.len());
            for record in &view.records {
                println!("  #{:<4} {}", record.num, preview(&record.question));
            }
        }

        if view.busy {
            let progress = (view.processed, view.total, view.failed);
            if self.last_progress != Some(progress) {
                self.last_progress = Some(progress);
                let kind = view.run_kind.map(kind_label).unwrap_or("batch");
                if view.failed > 0 {
                    println!(
                        "{kind}: {}/{} processed, {} failed",
                        view.processed, view.total, view.failed
                    );
                } else {
                    println!("{kind}: {}/{} processed", view.processed, view.total);
                }
                client_debug!("tick {}: {kind} progress {:?}", client_logging::get_poll_tick(), progress);
            }
        }

        if let Some(notice) = &view.notice {
            if self.last_notice.as_deref() != Some(notice.text.as_str()) {
                self.last_notice = Some(notice.text.clone());
                match notice.severity {
                    NoticeSeverity::Info => println!("{}", notice.text),
                    NoticeSeverity::Error => eprintln!("error: {}", notice.text),
                }
            }
        }

        if view.show_log && !self.printed_log {
            self.printed_log = true;
            println!("run outcome for {} items:", view.status_log.len());
            for row in &view.status_log {
                if row.succeeded {
                    println!("  #{:<4} ok", row.num);
                } else {
                    let reason = row.error.as_deref().unwrap_or("failed");
                    println!("  #{:<4} FAILED: {reason}", row.num);
                }
            }
        }
    }
}

fn preview(text: &str) -> &str {
    let mut end = text.len().min(60);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn save_history(view: &AppViewModel) {
    let Some(kind) = view.run_kind else {
        return;
    };
    let Some(project_id) = view.selected.clone() else {
        return;
    };
    persistence::append_run(
        &working_dir(),
        RunRecord {
            project_id,
            kind: kind_label(kind).to_string(),
            processed: view.processed,
            total: view.total,
            failed: view.failed,
            finished_at: Utc::now().to_rfc3339(),
        },
    );
}

fn kind_label(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Cleanup => "cleanup",
        JobKind::Synthesis => "synthesis",
    }
}

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
