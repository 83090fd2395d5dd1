//! Move Acquisition Integration Tests
//!
//! Drives `MoveAcquirer` over real HTTP against a stub inference server:
//! - Happy path and the legality fallback
//! - Retries on rate limits and server errors
//! - Terminal positions
//! - The proxy wire shape

mod common;

use common::{completion, fast_config, StubServer};
use llmchess::ai::transport::endpoint_from_config;
use llmchess::ai::{AcquireError, AttemptFailure, Difficulty, MoveAcquirer, MoveSource, TransportError};
use llmchess::game::PositionSnapshot;
use serde_json::json;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn opening_snapshot() -> PositionSnapshot {
    PositionSnapshot::new(
        "",
        START_FEN,
        vec!["e4".to_string(), "d4".to_string(), "Nf3".to_string()],
    )
}

// ============================================================================
// Acceptance Scenarios
// ============================================================================

#[tokio::test]
async fn test_legal_reply_is_returned() {
    //! A legal answer is used as is, on the first attempt
    let stub = StubServer::completions(vec![(200, completion("e4"))]).await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 5)).unwrap();

    let acquired = acquirer
        .acquire(&opening_snapshot(), Difficulty::Easy)
        .await
        .unwrap();

    assert_eq!(acquired.san, "e4");
    assert_eq!(acquired.source, MoveSource::Model);
    assert_eq!(acquired.attempts, 1);
    assert_eq!(acquired.snapshot_fen, START_FEN);
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_illegal_reply_falls_back_to_legal_move() {
    //! `Qh5+` is not in the list, so a legal move is substituted
    let stub = StubServer::completions(vec![(200, completion("Qh5+"))]).await;
    let config = fast_config("llama", &stub.url, 5);
    let acquirer =
        MoveAcquirer::with_seed(endpoint_from_config(&config).unwrap(), config.retry, 42);
    let snapshot = opening_snapshot();

    let acquired = acquirer.acquire(&snapshot, Difficulty::Medium).await.unwrap();

    assert_ne!(acquired.san, "Qh5+");
    assert!(snapshot.contains(&acquired.san));
    assert_eq!(acquired.source, MoveSource::Fallback);
    // Substitution is not a failure: no retry happened
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    //! Two 429s, then a legal move on the third attempt
    let limited = json!({"error": {"message": "Rate limit exceeded"}});
    let stub = StubServer::completions(vec![
        (429, limited.clone()),
        (429, limited),
        (200, completion("d4")),
    ])
    .await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 5)).unwrap();

    let acquired = acquirer
        .acquire(&opening_snapshot(), Difficulty::Hard)
        .await
        .unwrap();

    assert_eq!(acquired.san, "d4");
    assert_eq!(acquired.attempts, 3);
    assert_eq!(stub.requests().len(), 3);
}

#[tokio::test]
async fn test_server_errors_exhaust_attempts() {
    //! Every attempt answers 500; the failure propagates after the cap
    let failing = (500, json!({"error": "model crashed"}));
    let stub = StubServer::completions(vec![failing.clone(), failing.clone(), failing]).await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 3)).unwrap();

    let err = acquirer
        .acquire(&opening_snapshot(), Difficulty::Easy)
        .await
        .unwrap_err();

    match err {
        AcquireError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(
                last,
                AttemptFailure::Transport(TransportError::Server { status: 500, .. })
            ));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(stub.requests().len(), 3);
}

#[tokio::test]
async fn test_no_legal_moves_sends_nothing() {
    let stub = StubServer::completions(vec![(200, completion("e4"))]).await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 5)).unwrap();
    let snapshot = PositionSnapshot::new("1. f3 e5 2. g4 Qh4#", "irrelevant", Vec::new());

    let err = acquirer
        .acquire(&snapshot, Difficulty::Easy)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::NoLegalMoves));
    assert!(stub.requests().is_empty());
}

// ============================================================================
// Failure Mapping
// ============================================================================

#[tokio::test]
async fn test_persistent_rate_limit_is_reported_as_such() {
    let limited = (429, json!({"error": {"message": "quota exceeded"}}));
    let stub = StubServer::completions(vec![limited.clone(), limited]).await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 2)).unwrap();

    let err = acquirer
        .acquire(&opening_snapshot(), Difficulty::Easy)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::RateLimited { attempts: 2 }));
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    //! Port 9 on localhost is closed in any sane test environment
    let url = "http://127.0.0.1:9/v1/chat/completions";
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", url, 2)).unwrap();

    let err = acquirer
        .acquire(&opening_snapshot(), Difficulty::Easy)
        .await
        .unwrap_err();

    match &err {
        AcquireError::Unreachable {
            endpoint, attempts, ..
        } => {
            assert_eq!(endpoint, url);
            assert_eq!(*attempts, 2);
        }
        other => panic!("expected Unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_reply_is_retried() {
    let stub = StubServer::completions(vec![
        (200, completion("  ")),
        (200, json!({"choices": []})),
        (200, completion("Nf3")),
    ])
    .await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 5)).unwrap();

    let acquired = acquirer
        .acquire(&opening_snapshot(), Difficulty::Easy)
        .await
        .unwrap();

    assert_eq!(acquired.san, "Nf3");
    assert_eq!(acquired.attempts, 3);
}

// ============================================================================
// Wire Format
// ============================================================================

#[tokio::test]
async fn test_request_carries_prompt_and_sampling() {
    let stub = StubServer::completions(vec![(200, completion("e4"))]).await;
    let acquirer = MoveAcquirer::from_config(&fast_config("llama", &stub.url, 1)).unwrap();

    acquirer
        .acquire(&opening_snapshot(), Difficulty::Hard)
        .await
        .unwrap();

    let requests = stub.requests();
    let body = &requests[0];
    assert_eq!(body["model"], "qwen2.5-coder-7b");
    assert_eq!(body["max_tokens"], 10);
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("grandmaster"));
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains(START_FEN));
    assert!(user.contains("[e4, d4, Nf3]"));
}

#[tokio::test]
async fn test_proxy_provider_round_trip() {
    //! The proxy shape: `{systemMessage, userMessage}` in, `{move}` out
    let stub = StubServer::proxy(vec![
        (
            429,
            json!({"error": "Failed to connect to llama server", "message": "slow down"}),
        ),
        (200, json!({"move": "Nf3"})),
    ])
    .await;
    let acquirer = MoveAcquirer::from_config(&fast_config("proxy", &stub.url, 3)).unwrap();

    let acquired = acquirer
        .acquire(&opening_snapshot(), Difficulty::Easy)
        .await
        .unwrap();

    assert_eq!(acquired.san, "Nf3");
    assert_eq!(acquired.attempts, 2);
    let requests = stub.requests();
    assert!(requests[0]["systemMessage"].is_string());
    assert!(requests[0]["userMessage"]
        .as_str()
        .unwrap()
        .contains("Legal moves:"));
}
