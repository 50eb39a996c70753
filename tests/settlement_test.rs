//! Integration tests for credit settlement.
//!
//! Covers the full / partial / deferred branches, at-most-once charging
//! through the processed-job registry, and the single deduction retry.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reelgen::core::models::{FrameInterval, GenerationResult, VoiceTier};
use reelgen::core::settlement::{CreditSettlement, SettleOutcome};
use reelgen::ledger::LedgerClient;
use reelgen::storage::registry::ProcessedJobRegistry;

const USER: &str = "user-1";

fn ledger_for(server: &MockServer) -> Arc<LedgerClient> {
    Arc::new(
        LedgerClient::new(
            reelgen::core::http::default_client().expect("client"),
            server.uri(),
            "anon-key",
            Some(USER.to_string()),
        )
        .with_retry_delay(Duration::from_millis(10)),
    )
}

fn settlement_for(server: &MockServer, dir: &TempDir) -> CreditSettlement {
    let registry = ProcessedJobRegistry::open(dir.path().join("settled-jobs.json"));
    CreditSettlement::new(ledger_for(server), registry)
}

/// 25s of standard voice at 5s frames: ceil(25 * 3.3) = 83 credits.
fn completed_job(job_id: &str) -> GenerationResult {
    GenerationResult {
        job_id: job_id.to_string(),
        topic: "volcanoes".to_string(),
        video_url: Some("https://cdn.example/v.mp4".to_string()),
        audio_url: None,
        transcript_url: None,
        images_zip_url: None,
        thumbnail_url: None,
        audio_duration_secs: 25.0,
        voice_tier: VoiceTier::Standard,
        frame_interval: FrameInterval::Five,
    }
}

async fn mount_balance(server: &MockServer, credits: u64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_credits"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "remaining_credits": credits }])),
        )
        .mount(server)
        .await;
}

async fn mount_deduct_ok(server: &MockServer, amount: u64) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/use_multiple_credits"))
        .and(body_partial_json(json!({ "user_id": USER, "credit_amount": amount })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_settlement_charges_the_actual_cost() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 200).await;
    mount_deduct_ok(&server, 83).await;

    let settlement = settlement_for(&server, &dir);
    let outcome = settlement.settle(&completed_job("task-1")).await;
    assert_eq!(outcome, SettleOutcome::Settled { charged: 83 });
    assert!(outcome.is_settled());
}

#[tokio::test]
async fn shortfall_drains_the_remaining_balance() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 50).await;
    mount_deduct_ok(&server, 50).await;

    let settlement = settlement_for(&server, &dir);
    let outcome = settlement.settle(&completed_job("task-1")).await;
    assert_eq!(
        outcome,
        SettleOutcome::Partial {
            charged: 50,
            shortfall: 33
        }
    );
    // Partial settlement still counts: a second attempt must not re-charge.
    let again = settlement.settle(&completed_job("task-1")).await;
    assert_eq!(again, SettleOutcome::AlreadySettled);
}

#[tokio::test]
async fn zero_balance_defers_settlement() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 0).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/use_multiple_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(0)
        .mount(&server)
        .await;

    let settlement = settlement_for(&server, &dir);
    let outcome = settlement.settle(&completed_job("task-1")).await;
    assert_eq!(outcome, SettleOutcome::Deferred { cost: 83 });
    assert!(!outcome.is_settled());

    // The job stays eligible: a later attempt still tries to settle.
    let again = settlement.settle(&completed_job("task-1")).await;
    assert_eq!(again, SettleOutcome::Deferred { cost: 83 });
}

#[tokio::test]
async fn settle_is_idempotent_per_job() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/use_multiple_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let settlement = settlement_for(&server, &dir);
    assert_eq!(
        settlement.settle(&completed_job("task-1")).await,
        SettleOutcome::Settled { charged: 83 }
    );
    assert_eq!(
        settlement.settle(&completed_job("task-1")).await,
        SettleOutcome::AlreadySettled
    );
    // mock expectation verifies exactly one deduction on drop
}

#[tokio::test]
async fn registry_guard_survives_reopen() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 200).await;
    mount_deduct_ok(&server, 83).await;

    let settlement = settlement_for(&server, &dir);
    assert!(settlement.settle(&completed_job("task-1")).await.is_settled());
    drop(settlement);

    // A fresh settlement service over the same registry file sees the mark.
    let settlement = settlement_for(&server, &dir);
    assert_eq!(
        settlement.settle(&completed_job("task-1")).await,
        SettleOutcome::AlreadySettled
    );
}

#[tokio::test]
async fn refused_deduction_is_retried_once_then_succeeds() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 200).await;
    // First RPC call reports false (no internal retry applies); the
    // settlement layer retries the deduction once.
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/use_multiple_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/use_multiple_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let settlement = settlement_for(&server, &dir);
    assert_eq!(
        settlement.settle(&completed_job("task-1")).await,
        SettleOutcome::Settled { charged: 83 }
    );
}

#[tokio::test]
async fn persistent_refusal_leaves_the_job_unsettled() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_balance(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/use_multiple_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .expect(2)
        .mount(&server)
        .await;

    let settlement = settlement_for(&server, &dir);
    let outcome = settlement.settle(&completed_job("task-1")).await;
    assert_eq!(outcome, SettleOutcome::Failed { cost: 83 });
    assert!(!outcome.is_settled());
}

#[tokio::test]
async fn zero_cost_job_settles_without_touching_the_ledger() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = completed_job("task-1");
    job.audio_duration_secs = 0.0;

    let settlement = settlement_for(&server, &dir);
    assert_eq!(
        settlement.settle(&job).await,
        SettleOutcome::Settled { charged: 0 }
    );
}
