use std::sync::{mpsc, Arc};
use std::time::Duration;

use intervox_client::{
    ApiError, BackendApi, BackendEvent, BackendHandle, BatchRequest, CleanupRequest,
    ClientSettings, HttpBackend, JobKind, PollSettings,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL_INTERVAL: Duration = Duration::from_millis(60);

fn engine(server: &MockServer) -> (BackendHandle, mpsc::Receiver<BackendEvent>) {
    let settings = ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    };
    let api: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(&settings).expect("backend"));
    BackendHandle::new(
        api,
        PollSettings {
            interval: POLL_INTERVAL,
        },
    )
}

fn cleanup_request() -> BatchRequest {
    BatchRequest::Cleanup(CleanupRequest {
        overwrite_texts: true,
        overwrite_prompts: true,
        project_prompt: None,
    })
}

/// Await the next event without blocking the test runtime.
async fn next_event(rx: &mpsc::Receiver<BackendEvent>) -> BackendEvent {
    for _ in 0..200 {
        if let Ok(event) = rx.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no event within deadline");
}

fn drain(rx: &mpsc::Receiver<BackendEvent>) -> Vec<BackendEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn requests_to(server: &MockServer, wanted: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}

fn mount_start(server: &MockServer, route: &str, project: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/api/{route}/start/{project}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
}

#[tokio::test]
async fn cleanup_scenario_polls_to_completion() {
    let server = MockServer::start().await;
    mount_start(&server, "llm", "P1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 0,
            "total": 5
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 5,
            "total": 5
        })))
        .mount(&server)
        .await;

    let (handle, events) = engine(&server);
    handle.start_batch("P1", cleanup_request());

    let first = next_event(&events).await;
    let BackendEvent::BatchSample { kind, progress } = first else {
        panic!("expected a sample, got {first:?}");
    };
    assert_eq!(kind, JobKind::Cleanup);
    assert_eq!((progress.processed, progress.total), (0, 5));

    let second = next_event(&events).await;
    let BackendEvent::BatchSample { progress, .. } = second else {
        panic!("expected a sample, got {second:?}");
    };
    assert_eq!((progress.processed, progress.total), (5, 5));

    // The state machine reacts to the terminal sample with a cancel command.
    handle.cancel_polling();
}

#[tokio::test]
async fn start_failure_schedules_no_sampling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tts/start/P9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (handle, events) = engine(&server);
    handle.start_batch("P9", BatchRequest::Synthesis);

    let event = next_event(&events).await;
    assert_eq!(
        event,
        BackendEvent::BatchStartFailed {
            kind: JobKind::Synthesis,
            error: ApiError::Status(500),
        }
    );

    tokio::time::sleep(POLL_INTERVAL * 3).await;
    assert_eq!(requests_to(&server, "/api/tts/check_status/P9").await, 0);
    assert!(drain(&events).is_empty());
}

#[tokio::test]
async fn transient_sample_failure_keeps_polling() {
    let server = MockServer::start().await;
    mount_start(&server, "llm", "P1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 1,
            "total": 3
        })))
        .mount(&server)
        .await;

    let (handle, events) = engine(&server);
    handle.start_batch("P1", cleanup_request());

    let first = next_event(&events).await;
    assert_eq!(
        first,
        BackendEvent::BatchSampleFailed {
            kind: JobKind::Cleanup,
            error: ApiError::Status(500),
        }
    );

    // The failed sample did not stop the timer: the next tick samples again.
    let second = next_event(&events).await;
    let BackendEvent::BatchSample { progress, .. } = second else {
        panic!("expected a sample, got {second:?}");
    };
    assert_eq!((progress.processed, progress.total), (1, 3));

    handle.cancel_polling();
}

#[tokio::test]
async fn second_start_releases_the_first_poll() {
    let server = MockServer::start().await;
    mount_start(&server, "llm", "P1").mount(&server).await;
    mount_start(&server, "tts", "P1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 0,
            "total": 100
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tts/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 0,
            "total": 50
        })))
        .mount(&server)
        .await;

    let (handle, events) = engine(&server);
    handle.start_batch("P1", cleanup_request());
    let first = next_event(&events).await;
    assert!(matches!(
        first,
        BackendEvent::BatchSample {
            kind: JobKind::Cleanup,
            ..
        }
    ));

    // Last start wins: the synthesis run takes over the single slot.
    handle.start_batch("P1", BatchRequest::Synthesis);
    loop {
        let event = next_event(&events).await;
        if let BackendEvent::BatchSample { kind, .. } = event {
            if kind == JobKind::Synthesis {
                break;
            }
        }
    }

    // From here on only synthesis samples may appear.
    drain(&events);
    tokio::time::sleep(POLL_INTERVAL * 4).await;
    for event in drain(&events) {
        assert!(
            matches!(
                event,
                BackendEvent::BatchSample {
                    kind: JobKind::Synthesis,
                    ..
                }
            ),
            "unexpected event after takeover: {event:?}"
        );
    }

    handle.cancel_polling();
}

#[tokio::test]
async fn cancel_stops_sampling_before_the_next_interval() {
    let server = MockServer::start().await;
    mount_start(&server, "llm", "P1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 0,
            "total": 10
        })))
        .mount(&server)
        .await;

    let (handle, events) = engine(&server);
    handle.start_batch("P1", cleanup_request());
    let _ = next_event(&events).await;

    handle.cancel_polling();
    // Give any in-flight sample a moment to settle, then freeze the count.
    tokio::time::sleep(POLL_INTERVAL).await;
    drain(&events);
    let frozen = requests_to(&server, "/api/llm/check_status/P1").await;

    tokio::time::sleep(POLL_INTERVAL * 4).await;
    assert_eq!(
        requests_to(&server, "/api/llm/check_status/P1").await,
        frozen
    );
    assert!(drain(&events).is_empty());
}

#[tokio::test]
async fn cancel_without_an_active_poll_is_a_noop() {
    let server = MockServer::start().await;
    mount_start(&server, "llm", "P1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/llm/check_status/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed": 0,
            "total": 2
        })))
        .mount(&server)
        .await;

    let (handle, events) = engine(&server);
    handle.cancel_polling();
    handle.cancel_polling();
    tokio::time::sleep(POLL_INTERVAL).await;
    assert!(drain(&events).is_empty());

    // The slot is still usable afterwards.
    handle.start_batch("P1", cleanup_request());
    let event = next_event(&events).await;
    assert!(matches!(event, BackendEvent::BatchSample { .. }));
    handle.cancel_polling();
}
