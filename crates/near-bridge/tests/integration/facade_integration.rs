//! End-to-end facade behavior over a recording transport.

use std::fs;
use std::sync::Arc;

use near_bridge::*;

use crate::common::{RecordingTransport, account, client, network};

const ONE_NEAR_YOCTO: &str = "1000000000000000000000000";

/// Check an envelope was signed by `key_pair` over `{method, body}`.
fn assert_signed_by(method: &str, envelope: &serde_json::Value, key_pair: &KeyPair) {
    let signed: SignedTransaction = serde_json::from_value(envelope.clone()).unwrap();
    assert_eq!(signed.public_key, key_pair.public_key());

    let hash = TransactionBody {
        method,
        params: &signed.body,
    }
    .hash()
    .unwrap();
    assert_eq!(signed.hash, bs58::encode(hash).into_string());
    assert!(signed.signature.verify(&hash, key_pair.public_key()));
}

// =============================================================================
// Credential resolution
// =============================================================================

#[tokio::test]
async fn test_schedule_without_key_sends_nothing() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "h"}));
    let near = client(&transport, KeyStoreConfig::InMemory);

    let err = near
        .schedule_function_call(
            NearToken::from_near(0),
            "alice",
            "counter",
            "increment",
            &serde_json::json!({}),
        )
        .await
        .unwrap_err();

    assert!(err.is_key_not_found(), "{err:?}");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_every_write_without_key_sends_nothing() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "h"}));
    let near = client(&transport, KeyStoreConfig::InMemory);

    let results = [
        near.deploy_contract("alice", "alice", vec![0u8], "ed25519:P").await,
        near.send_money("alice", "bob", NearToken::from_near(1)).await,
        near.create_account("alice", "carol", NearToken::from_near(1), "ed25519:P")
            .await,
        near.stake("alice", NearToken::from_near(1)).await,
        near.swap_key("alice", "ed25519:A", "ed25519:B").await,
    ];

    for result in results {
        assert!(result.unwrap_err().is_key_not_found());
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_corrupt_key_file_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("near_alice"),
        r#"{"account_id":"alice","public_key":"P"}"#,
    )
    .unwrap();

    let transport = RecordingTransport::replying(serde_json::json!({"hash": "h"}));
    let near = client(
        &transport,
        KeyStoreConfig::FileSystem {
            key_dir: dir.path().to_path_buf(),
        },
    );

    let err = near
        .schedule_function_call(NearToken::from_near(0), "alice", "counter", "increment", &())
        .await
        .unwrap_err();

    assert!(err.is_malformed_record(), "{err:?}");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_key_written_after_failure_is_picked_up() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "h"}));
    let near = client(&transport, KeyStoreConfig::InMemory);

    assert!(
        near.stake("alice", NearToken::from_near(1))
            .await
            .unwrap_err()
            .is_key_not_found()
    );

    near.generate_key("alice").unwrap();
    let receipt = tokio_test::assert_ok!(near.stake("alice", NearToken::from_near(1)).await);
    assert_eq!(receipt.hash, "h");
    assert_eq!(transport.call_count(), 1);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_view_call_decodes_result_and_leaves_keys_alone() {
    let transport = RecordingTransport::replying(serde_json::json!({
        "result": codec::encode_args(&serde_json::json!({"count": 42})).unwrap(),
    }));
    let store = Arc::new(InMemoryKeyStore::new());
    store
        .set_key(&account("alice"), &KeyPair::new("P", "S"), &network("near"))
        .unwrap();
    let near = client(&transport, KeyStoreConfig::Custom(store.clone()));

    let result: serde_json::Value = near
        .call_view_function("bob", "counter", "get_count", &serde_json::json!({"x": 1}))
        .await
        .unwrap();
    assert_eq!(result, serde_json::json!({"count": 42}));

    let call = transport.last_call();
    assert_eq!(call.method, "call_view_function");
    assert_eq!(
        call.params,
        serde_json::json!({
            "originator": "bob",
            "contract_account_id": "counter",
            "method_name": "get_count",
            "args": codec::encode_args(&serde_json::json!({"x": 1})).unwrap(),
        })
    );

    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get_account_ids(&network("near")).unwrap(),
        vec![account("alice")]
    );
    assert_eq!(
        store.get_key(&account("alice"), &network("near")).unwrap(),
        KeyPair::new("P", "S")
    );
}

#[tokio::test]
async fn test_view_call_empty_result_is_null() {
    let transport = RecordingTransport::replying(serde_json::json!({"result": []}));
    let near = client(&transport, KeyStoreConfig::InMemory);

    let result: Option<u64> = near
        .call_view_function("bob", "counter", "reset", &())
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_view_account_and_state_params() {
    let transport = RecordingTransport::new(|method, _| match method {
        "view_account" => Ok(serde_json::json!({"account_id": "bob", "amount": "10"})),
        "view_state" => Ok(serde_json::json!({"values": {}})),
        other => panic!("unexpected method {other}"),
    });
    let near = client(&transport, KeyStoreConfig::InMemory);

    let account_view = near.view_account("bob").await.unwrap();
    assert_eq!(account_view["amount"], "10");
    let state = near.view_state("counter").await.unwrap();
    assert_eq!(state, serde_json::json!({"values": {}}));

    let calls = transport.calls();
    assert_eq!(calls[0].params, serde_json::json!({"account_id": "bob"}));
    assert_eq!(
        calls[1].params,
        serde_json::json!({"contract_account_id": "counter"})
    );
}

#[tokio::test]
async fn test_transaction_status_is_passed_through() {
    let record = serde_json::json!({"status": "Completed", "logs": ["a", "b"], "result": null});
    let transport = RecordingTransport::replying(record.clone());
    let near = client(&transport, KeyStoreConfig::InMemory);

    let status = near.get_transaction_status("9vW2").await.unwrap();

    assert_eq!(status, record);
    let call = transport.last_call();
    assert_eq!(call.method, "get_transaction_status");
    assert_eq!(call.params, serde_json::json!({"hash": "9vW2"}));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_schedule_function_call_envelope() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "tx-1"}));
    let near = client(&transport, KeyStoreConfig::InMemory);
    let key_pair = near.generate_key("alice").unwrap();

    let receipt = near
        .schedule_function_call(
            NearToken::from_near(1),
            "alice",
            "counter",
            "increment",
            &serde_json::json!({"by": 2}),
        )
        .await
        .unwrap();
    assert_eq!(receipt.hash, "tx-1");

    let call = transport.last_call();
    assert_eq!(call.method, "schedule_function_call");
    assert_eq!(
        call.params["body"],
        serde_json::json!({
            "originator": "alice",
            "contract_account_id": "counter",
            "method_name": "increment",
            "args": codec::encode_args(&serde_json::json!({"by": 2})).unwrap(),
            "amount": ONE_NEAR_YOCTO,
        })
    );
    assert_signed_by("schedule_function_call", &call.params, &key_pair);
}

#[tokio::test]
async fn test_deploy_contract_envelope() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "tx-2"}));
    let near = client(&transport, KeyStoreConfig::InMemory);
    let key_pair = near.generate_key("alice").unwrap();

    let receipt = near
        .deploy_contract("alice", "counter", b"\0asm".to_vec(), key_pair.public_key())
        .await
        .unwrap();
    assert_eq!(receipt.hash, "tx-2");

    let call = transport.last_call();
    assert_eq!(call.method, "deploy_contract");
    assert_eq!(
        call.params["body"],
        serde_json::json!({
            "originator": "alice",
            "contract_account_id": "counter",
            "wasm_byte_array": [0, 97, 115, 109],
            "public_key": key_pair.public_key(),
        })
    );
    assert_signed_by("deploy_contract", &call.params, &key_pair);
}

#[tokio::test]
async fn test_account_operations_envelopes() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "h"}));
    let near = client(&transport, KeyStoreConfig::InMemory);
    let key_pair = near.generate_key("alice").unwrap();

    near.send_money("alice", "bob", NearToken::from_near(1))
        .await
        .unwrap();
    near.create_account("alice", "carol", NearToken::from_near(1), "ed25519:C")
        .await
        .unwrap();
    near.stake("alice", NearToken::from_near(1)).await.unwrap();
    near.swap_key("alice", key_pair.public_key(), "ed25519:N")
        .await
        .unwrap();

    let calls = transport.calls();
    let expected = [
        (
            "send_money",
            serde_json::json!({
                "originator": "alice",
                "receiver_account_id": "bob",
                "amount": ONE_NEAR_YOCTO,
            }),
        ),
        (
            "create_account",
            serde_json::json!({
                "originator": "alice",
                "new_account_id": "carol",
                "amount": ONE_NEAR_YOCTO,
                "public_key": "ed25519:C",
            }),
        ),
        (
            "stake",
            serde_json::json!({"originator": "alice", "amount": ONE_NEAR_YOCTO}),
        ),
        (
            "swap_key",
            serde_json::json!({
                "account": "alice",
                "current_key": key_pair.public_key(),
                "new_key": "ed25519:N",
            }),
        ),
    ];

    assert_eq!(calls.len(), expected.len());
    for (call, (method, body)) in calls.iter().zip(expected) {
        assert_eq!(call.method, method);
        assert_eq!(call.params["body"], body);
        assert_signed_by(method, &call.params, &key_pair);
    }
}

#[tokio::test]
async fn test_custom_signer_is_used_for_writes() {
    let transport = RecordingTransport::replying(serde_json::json!({"hash": "h"}));
    let key_pair = KeyPair::from_random();
    let near = Near::local()
        .network_id("near")
        .signer(InMemorySigner::new("bot", key_pair.clone()).unwrap())
        .transport(transport.clone())
        .build()
        .unwrap();

    near.send_money("bot", "bob", NearToken::from_near(1))
        .await
        .unwrap();
    assert_signed_by("send_money", &transport.last_call().params, &key_pair);

    // The signer knows nothing about other accounts
    assert!(
        near.send_money("alice", "bob", NearToken::from_near(1))
            .await
            .unwrap_err()
            .is_key_not_found()
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_invalid_account_id_is_rejected_locally() {
    let transport = RecordingTransport::replying(serde_json::json!({}));
    let near = client(&transport, KeyStoreConfig::InMemory);

    let err = tokio_test::assert_err!(near.view_account("Not Valid!").await);
    assert!(matches!(err, Error::ParseAccountId(_)));
    assert_eq!(transport.call_count(), 0);
}

// =============================================================================
// Failure kinds
// =============================================================================

#[tokio::test]
async fn test_node_error_and_transport_failure_are_distinct() {
    let transport = RecordingTransport::new(|method, _| match method {
        "view_account" => Err(RpcError::node(-32000, "account bob does not exist", None)),
        _ => Err(RpcError::network("connection reset", None)),
    });
    let near = client(&transport, KeyStoreConfig::InMemory);

    let node_error = near.view_account("bob").await.unwrap_err();
    assert!(node_error.is_node_error());
    assert!(!node_error.is_transport_failure());

    let transport_failure = near.view_state("counter").await.unwrap_err();
    assert!(transport_failure.is_transport_failure());
    assert!(!transport_failure.is_node_error());

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_rejected_submission_is_node_error() {
    let transport = RecordingTransport::new(|_, _| {
        Err(RpcError::node(
            -32000,
            "Server error",
            Some(serde_json::json!("insufficient balance")),
        ))
    });
    let near = client(&transport, KeyStoreConfig::InMemory);
    near.generate_key("alice").unwrap();

    let err = near
        .send_money("alice", "bob", NearToken::from_near(1000))
        .await
        .unwrap_err();

    match err {
        Error::Rpc(RpcError::Node { code, data, .. }) => {
            assert_eq!(code, -32000);
            assert_eq!(data, Some(serde_json::json!("insufficient balance")));
        }
        other => panic!("expected node error, got {:?}", other),
    }
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_unexpected_view_shape_is_transport_failure() {
    let transport = RecordingTransport::replying(serde_json::json!({"value": 1}));
    let near = client(&transport, KeyStoreConfig::InMemory);

    let result: Result<serde_json::Value, Error> = near
        .call_view_function("bob", "counter", "get_count", &())
        .await;
    let err = result.unwrap_err();
    assert!(err.is_transport_failure(), "{err:?}");
}
