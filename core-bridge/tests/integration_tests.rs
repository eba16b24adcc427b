// =====================================================================================
// File: core-bridge/tests/integration_tests.rs
// Description: End-to-end scenarios across the bridge coordination core
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use core_bridge::atomic_swap::{AtomicSwapConfig, AtomicSwapEngine};
use core_bridge::chain::mock::InMemoryChainAdapter;
use core_bridge::multisig::{canonical_signable_payload, MultiSigEngine, PermissiveVerifier};
use core_bridge::orchestrator::{BridgeOrchestrator, OrchestratorConfig};
use core_bridge::queue::{MessageQueue, QueueConfig};
use core_bridge::service::BridgeService;
use core_bridge::types::{SwapStatus, TransferStatus};
use rust_decimal::Decimal;
use std::sync::Arc;

fn wired_service() -> (Arc<BridgeOrchestrator>, BridgeService) {
    let orchestrator = Arc::new(BridgeOrchestrator::new(OrchestratorConfig::default()));
    orchestrator.register_adapter(Arc::new(InMemoryChainAdapter::new("ethereum", 12)));
    orchestrator.register_adapter(Arc::new(InMemoryChainAdapter::new("polygon", 128)));

    let swap_engine = Arc::new(AtomicSwapEngine::new(AtomicSwapConfig::default()));
    let multisig_engine = Arc::new(MultiSigEngine::new(Arc::new(PermissiveVerifier)));
    let queue = Arc::new(MessageQueue::new(QueueConfig::default()));

    let service = BridgeService::new(
        orchestrator.clone(),
        swap_engine,
        multisig_engine,
        queue,
    );
    (orchestrator, service)
}

/// Scenario A: happy-path bridge transfer from initiation through
/// validator sign-off to target-chain completion.
#[tokio::test]
async fn scenario_happy_bridge_transfer() {
    let (orchestrator, service) = wired_service();
    assert!(service.check_not_paused().is_ok());

    let transfer = orchestrator
        .initiate_bridge(
            "ethereum".to_string(),
            "polygon".to_string(),
            "0xsource".to_string(),
            "0xtarget".to_string(),
            "USDC".to_string(),
            Decimal::new(500, 0),
            1,
        )
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Pending);

    let validators = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
    let collection_id = service.multisig_engine.open(transfer.id, validators).unwrap();
    let payload = canonical_signable_payload(
        transfer.id,
        &transfer.source_chain,
        &transfer.target_chain,
        &transfer.source_address,
        &transfer.target_address,
        &transfer.token_symbol,
        transfer.amount,
        transfer.nonce,
    );
    service
        .multisig_engine
        .add_signature(collection_id, "v1", "aa", &payload)
        .unwrap();
    let threshold_met = service
        .multisig_engine
        .add_signature(collection_id, "v2", "bb", &payload)
        .unwrap();
    assert!(threshold_met);

    orchestrator.advance_to_confirming(transfer.id).await.unwrap();
    orchestrator
        .complete_transfer(transfer.id, "0xtarget_execution_tx")
        .await
        .unwrap();

    let done = orchestrator.get_transfer(transfer.id).unwrap();
    assert_eq!(done.status, TransferStatus::Completed);
    assert_eq!(service.get_statistics().total_transfers_completed, 1);
}

/// Scenario B: a transfer above the destination chain's limit is rejected
/// before any state is created.
#[tokio::test]
async fn scenario_limit_exceeded_rejected_at_initiation() {
    let (orchestrator, _service) = wired_service();
    let result = orchestrator.initiate_bridge(
        "bsc".to_string(),
        "polygon".to_string(),
        "0xsource".to_string(),
        "0xtarget".to_string(),
        "USDT".to_string(),
        Decimal::new(150_000, 0),
        1,
    );
    assert!(result.is_err());
}

/// Scenario C: source and target chain must differ.
#[tokio::test]
async fn scenario_same_chain_rejected() {
    let (orchestrator, _service) = wired_service();
    let result = orchestrator.initiate_bridge(
        "ethereum".to_string(),
        "ethereum".to_string(),
        "0xsource".to_string(),
        "0xtarget".to_string(),
        "USDC".to_string(),
        Decimal::new(500, 0),
        1,
    );
    assert!(result.is_err());
}

/// Scenario D: a full atomic swap from initiation to secret-reveal
/// completion.
#[tokio::test]
async fn scenario_atomic_swap_happy_path() {
    let (_orchestrator, service) = wired_service();
    let (swap_id, secret) = service
        .atomic_swap_engine
        .initiate_swap(
            "ethereum".to_string(),
            "polygon".to_string(),
            "0xinitiator".to_string(),
            "0xparticipant".to_string(),
            Decimal::new(250, 0),
            None,
        )
        .unwrap();

    service.atomic_swap_engine.lock_source(swap_id, "0xsrc_lock_tx").unwrap();
    service.atomic_swap_engine.lock_target(swap_id, "0xtgt_lock_tx").unwrap();
    service
        .atomic_swap_engine
        .complete_swap(swap_id, &secret, "0xredeem_tx")
        .unwrap();

    let swap = service.atomic_swap_engine.get_swap(swap_id).unwrap();
    assert_eq!(swap.status, SwapStatus::Completed);
}

/// Scenario E: a swap whose revealed secret does not match its hashlock is
/// rejected and produces a verifiable fraud proof, exercising the real
/// `complete_swap` path rather than fabricating the proof directly.
#[tokio::test]
async fn scenario_fraud_detected_produces_verifiable_proof() {
    let (_orchestrator, service) = wired_service();
    let (swap_id, _secret) = service
        .atomic_swap_engine
        .initiate_swap(
            "ethereum".to_string(),
            "polygon".to_string(),
            "0xinitiator".to_string(),
            "0xparticipant".to_string(),
            Decimal::new(250, 0),
            None,
        )
        .unwrap();
    service.atomic_swap_engine.lock_source(swap_id, "0xsrc_lock_tx").unwrap();
    service.atomic_swap_engine.lock_target(swap_id, "0xtgt_lock_tx").unwrap();

    let result = service
        .atomic_swap_engine
        .complete_swap(swap_id, "not_the_real_secret", "0xredeem_tx");
    assert!(result.is_err());

    let swap = service.atomic_swap_engine.get_swap(swap_id).unwrap();
    assert_eq!(swap.status, SwapStatus::FraudDetected);

    let proof = service.atomic_swap_engine.get_fraud_proof(swap_id).unwrap();
    assert!(service.atomic_swap_engine.verify_fraud_proof(&proof));
}

/// Scenario F: a swap whose time lock elapses without completion is
/// refundable, but not before expiry.
#[tokio::test]
async fn scenario_swap_timeout_then_refund() {
    let (_orchestrator, service) = wired_service();
    let (swap_id, _secret) = service
        .atomic_swap_engine
        .initiate_swap(
            "ethereum".to_string(),
            "polygon".to_string(),
            "0xinitiator".to_string(),
            "0xparticipant".to_string(),
            Decimal::new(250, 0),
            Some(1),
        )
        .unwrap();

    assert!(service.atomic_swap_engine.refund_swap(swap_id, "0xrefund_tx").is_err());
}

#[tokio::test]
async fn message_delivery_round_trips_through_queue() {
    let (_orchestrator, service) = wired_service();
    let message_id = service
        .message_queue
        .send("ethereum".to_string(), "polygon".to_string(), 1, b"payload".to_vec())
        .unwrap();

    let next = service.message_queue.process_next("polygon").unwrap().unwrap();
    assert_eq!(next.id, message_id);
    service.message_queue.acknowledge(message_id).unwrap();

    let delivered = service.message_queue.get(message_id).unwrap();
    assert_eq!(delivered.status, core_bridge::types::MessageStatus::Delivered);
}
