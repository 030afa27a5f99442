use std::sync::Arc;
use std::time::Duration;

use client_logging::client_warn;
use tokio_util::sync::CancellationToken;

use crate::api::BackendApi;
use crate::handle::{BackendEvent, EventSink};
use crate::types::BatchRequest;

/// Timing knobs for the poll engine.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Delay between progress samples for an active batch run.
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
        }
    }
}

/// Drive one batch run: issue the start request, then sample progress until
/// the token is cancelled.
///
/// The loop never decides termination itself; the state machine observes the
/// samples and releases the poll through a cancel command. An in-flight
/// response that resolves after cancellation is dropped rather than emitted,
/// so a reused poll slot can never apply a stale snapshot.
pub(crate) async fn run_poll(
    api: Arc<dyn BackendApi>,
    project_id: String,
    request: BatchRequest,
    settings: PollSettings,
    token: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    let kind = request.kind();
    if let Err(error) = api.start_batch(&project_id, &request).await {
        client_warn!("{kind} start failed for {project_id}: {error}");
        if !token.is_cancelled() {
            sink.emit(BackendEvent::BatchStartFailed { kind, error });
        }
        return;
    }

    // The first tick completes immediately: the eager sample right after a
    // successful start, before the interval elapses once.
    let mut ticks = tokio::time::interval(settings.interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticks.tick() => {}
        }
        match api.check_status(kind, &project_id).await {
            Ok(progress) => {
                if token.is_cancelled() {
                    return;
                }
                sink.emit(BackendEvent::BatchSample { kind, progress });
            }
            Err(error) => {
                // Transient by policy: log, surface, keep the timer alive.
                client_warn!("{kind} progress sample failed for {project_id}: {error}");
                if token.is_cancelled() {
                    return;
                }
                sink.emit(BackendEvent::BatchSampleFailed { kind, error });
            }
        }
    }
}
