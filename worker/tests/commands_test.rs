//! Integration tests for CLI command handlers.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use vigil_audit::{FetchResult, PageFetcher};
use vigil_core::AppConfig;
use vigil_db::Database;
use vigil_scheduler::CancellationToken;
use vigil_worker::cli::{EnqueueArgs, ReportArgs, RunArgs, StatusArgs};
use vigil_worker::commands::{audit, report, worker};
use vigil_worker::state::AppState;

struct StaticPage;

#[async_trait]
impl PageFetcher for StaticPage {
    async fn fetch(&self, url: &str) -> vigil_audit::Result<FetchResult> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        Ok(FetchResult {
            final_url: url.to_string(),
            status_code: 200,
            headers,
            body: Some("<html><head><title>Hello</title></head><body><h1>Hi</h1></body></html>".to_string()),
            redirect_chain: vec![url.to_string()],
            duration_ms: 5,
            http_version: Some("HTTP/1.1".to_string()),
            errors: Vec::new(),
        })
    }
}

/// Helper to create wired state over a fresh in-memory database.
async fn create_test_state(publish: bool) -> AppState {
    let db = Database::new(":memory:").await.expect("open db");
    db.run_migrations().await.expect("run migrations");

    let mut config = AppConfig::default();
    config.publish.enabled = publish;
    config.worker.initial_delay_ms = 0;
    config.worker.poll_interval_ms = 10;

    AppState::build(config, Arc::new(db), Arc::new(StaticPage))
}

fn json_docs(out: &[u8]) -> Vec<Value> {
    serde_json::Deserializer::from_slice(out)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("valid JSON output")
}

#[tokio::test]
async fn test_enqueue_now_status_and_report() {
    let state = create_test_state(true).await;

    let mut out = Vec::new();
    let args = EnqueueArgs {
        url: "https://example.com".to_string(),
        now: true,
    };
    audit::enqueue(&state, &args, &mut out).await.expect("enqueue");

    let docs = json_docs(&out);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["status"], "QUEUED");
    assert_eq!(docs[0]["normalizedUrl"], "https://example.com/");
    assert_eq!(docs[1]["processed"], true);
    assert_eq!(docs[1]["outcome"], "completed");

    let run_id = docs[0]["runId"].as_str().expect("run id").to_string();
    let token = docs[1]["publicToken"].as_str().expect("token").to_string();

    let mut out = Vec::new();
    audit::status(&state, &StatusArgs { run_id }, &mut out)
        .await
        .expect("status");
    let status = &json_docs(&out)[0];
    assert_eq!(status["status"], "COMPLETED");
    assert_eq!(status["hasResult"], true);

    let mut out = Vec::new();
    report::show(&state, &ReportArgs { token }, &mut out)
        .await
        .expect("report");
    let public = &json_docs(&out)[0];
    assert_eq!(public["domain"], "example.com");
    assert_eq!(public["site"]["title"], "Hello");
}

#[tokio::test]
async fn test_publication_can_be_disabled() {
    let state = create_test_state(false).await;

    audit::enqueue(
        &state,
        &EnqueueArgs {
            url: "https://example.com".to_string(),
            now: false,
        },
        &mut Vec::new(),
    )
    .await
    .expect("enqueue");

    let mut out = Vec::new();
    audit::once(&state, &mut out).await.expect("once");
    let processed = &json_docs(&out)[0];
    assert_eq!(processed["outcome"], "completed");
    assert!(processed.get("publicToken").is_none());
}

#[tokio::test]
async fn test_once_on_empty_queue() {
    let state = create_test_state(true).await;

    let mut out = Vec::new();
    audit::once(&state, &mut out).await.expect("once");
    assert_eq!(json_docs(&out)[0], serde_json::json!({"processed": false}));
}

#[tokio::test]
async fn test_unknown_run_and_token_are_errors() {
    let state = create_test_state(true).await;

    let missing = StatusArgs {
        run_id: "8f14e45f-ceea-467f-a0e6-8f2b5c3d9a10".to_string(),
    };
    assert!(audit::status(&state, &missing, &mut Vec::new()).await.is_err());

    let malformed = StatusArgs {
        run_id: "not-a-uuid".to_string(),
    };
    assert!(audit::status(&state, &malformed, &mut Vec::new()).await.is_err());

    let token = ReportArgs {
        token: "nope".to_string(),
    };
    assert!(report::show(&state, &token, &mut Vec::new()).await.is_err());
}

#[tokio::test]
async fn test_poll_queue_drains_until_cancelled() {
    let state = create_test_state(false).await;
    for url in ["https://a.example.com", "https://b.example.com"] {
        state.service.create_audit(url).await.expect("enqueue");
    }

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        stopper.cancel();
    });

    worker::poll_queue(&state, &RunArgs::default(), cancel)
        .await
        .expect("poll queue");

    let mut out = Vec::new();
    audit::once(&state, &mut out).await.expect("once");
    assert_eq!(json_docs(&out)[0]["processed"], false);
}

#[tokio::test]
async fn test_zero_poll_interval_is_rejected() {
    let state = create_test_state(false).await;
    state.service.create_audit("https://example.com").await.expect("enqueue");

    let args = RunArgs {
        interval_ms: Some(0),
    };
    assert!(worker::poll_interval(&state, &args).is_err());
    assert!(worker::poll_queue(&state, &args, CancellationToken::new())
        .await
        .is_err());

    // Nothing was polled.
    let mut out = Vec::new();
    audit::once(&state, &mut out).await.expect("once");
    assert_eq!(json_docs(&out)[0]["processed"], true);

    let args = RunArgs {
        interval_ms: Some(25),
    };
    assert_eq!(
        worker::poll_interval(&state, &args).expect("interval"),
        Duration::from_millis(25)
    );
    assert_eq!(
        worker::poll_interval(&state, &RunArgs::default()).expect("interval"),
        Duration::from_millis(10)
    );
}

#[test]
fn test_cli_rejects_zero_interval() {
    use clap::Parser;
    use vigil_worker::cli::{Cli, Commands};

    assert!(Cli::try_parse_from(["vigil", "run", "--interval-ms", "0"]).is_err());

    let cli = Cli::try_parse_from(["vigil", "run", "--interval-ms", "500"]).expect("parse");
    let Commands::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(args.interval_ms, Some(500));
}

#[tokio::test]
async fn test_signal_cancels_worker() {
    let cancel = CancellationToken::new();
    worker::cancel_on_signal(async { Ok(()) }, cancel.clone()).await;
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_failed_signal_registration_keeps_worker_running() {
    let cancel = CancellationToken::new();
    let failed = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal handler")) };
    worker::cancel_on_signal(failed, cancel.clone()).await;
    assert!(!cancel.is_cancelled());
}
