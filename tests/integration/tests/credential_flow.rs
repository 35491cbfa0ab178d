//! Integration test: issuer → holder → verifier without the anchoring layer.
//!
//! Issuer documents are resolved from a local table, so these tests exercise
//! credo-credentials, credo-identity and credo-crypto together.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use credo_core::{CredentialStatus, Did};
use credo_credentials::{
    current_status, Claims, CredentialIssuer, CredentialWallet, RevocationCheck, StatusTracker,
    VerifiableCredential, VerificationEngine, VerificationOutcome,
};
use credo_crypto::KeyPair;
use credo_identity::{DidDeriver, DocumentBuilder, LocalDidResolver};

/// Helper: an issuer with a fresh key pair, and its document registered in
/// `resolver`.
fn create_issuer(resolver: &LocalDidResolver) -> CredentialIssuer {
    let kp = KeyPair::generate().unwrap();
    let did = DidDeriver::key_did(&kp.public_key());
    resolver.insert(DocumentBuilder::build(&did, kp.public_key().to_jwk()));
    CredentialIssuer::new(did, kp)
}

fn holder() -> Did {
    DidDeriver::key_did(&KeyPair::generate().unwrap().public_key())
}

fn claims(pairs: &[(&str, serde_json::Value)]) -> Claims {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =========================================================================
// Issuer → Holder → Verifier
// =========================================================================

#[tokio::test]
async fn test_issue_store_and_verify() {
    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);
    let holder_did = holder();
    let wallet = CredentialWallet::new(holder_did.clone());

    let vc = issuer
        .issue(
            &holder_did,
            "Education Certificate",
            claims(&[("degree", json!("BSc")), ("year", json!(2024))]),
            Some(Utc::now() + Duration::days(365)),
        )
        .unwrap();
    wallet.store(vc.clone()).unwrap();

    let stored = wallet.get(&vc.id).unwrap();
    let engine = VerificationEngine::new();
    let tracker = StatusTracker::new();
    let (outcome, status) = engine
        .verify_and_track(&stored, &resolver, &tracker, Utc::now())
        .await;
    assert!(outcome.is_valid());
    assert_eq!(status, CredentialStatus::Verified);

    let statuses = wallet.statuses(&tracker, Utc::now());
    assert_eq!(statuses, vec![(vc.id.clone(), CredentialStatus::Verified)]);
}

#[tokio::test]
async fn test_export_import_roundtrip_still_verifies() {
    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);
    let vc = issuer
        .issue(&holder(), "Education Certificate", claims(&[("degree", json!("BSc"))]), None)
        .unwrap();

    let exported = vc.export_json(CredentialStatus::Verified).unwrap();
    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(value["data"]["degree"], "BSc");
    assert_eq!(value["status"], "verified");

    let imported = VerifiableCredential::import_json(&exported).unwrap();
    let outcome = VerificationEngine::new()
        .verify(&imported, &resolver, Utc::now())
        .await;
    assert!(outcome.is_valid());
}

#[tokio::test]
async fn test_wrong_issuer_key_fails() {
    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);

    // Same DID, different key.
    let impostor = CredentialIssuer::new(issuer.did().clone(), KeyPair::generate().unwrap());
    let vc = impostor
        .issue(&holder(), "Education Certificate", Claims::new(), None)
        .unwrap();

    let outcome = VerificationEngine::new().verify(&vc, &resolver, Utc::now()).await;
    assert_eq!(outcome, VerificationOutcome::SignatureMismatch);
}

#[tokio::test]
async fn test_status_moves_back_to_pending_after_failure() {
    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);
    let engine = VerificationEngine::new();
    let tracker = StatusTracker::new();

    let mut vc = issuer
        .issue(&holder(), "Employment", claims(&[("role", json!("engineer"))]), None)
        .unwrap();
    let (_, status) = engine.verify_and_track(&vc, &resolver, &tracker, Utc::now()).await;
    assert_eq!(status, CredentialStatus::Verified);

    vc.claims.insert("role".into(), json!("director"));
    let (outcome, status) = engine.verify_and_track(&vc, &resolver, &tracker, Utc::now()).await;
    assert_eq!(outcome, VerificationOutcome::SignatureMismatch);
    assert_eq!(status, CredentialStatus::Pending);
}

#[tokio::test]
async fn test_altered_copy_reads_pending_without_verification() {
    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);
    let engine = VerificationEngine::new();
    let tracker = StatusTracker::new();

    let vc = issuer
        .issue(&holder(), "Education Certificate", claims(&[("degree", json!("BSc"))]), None)
        .unwrap();
    let (_, status) = engine.verify_and_track(&vc, &resolver, &tracker, Utc::now()).await;
    assert_eq!(status, CredentialStatus::Verified);

    // Same id, different claims, never verified itself.
    let mut forged = vc.clone();
    forged.claims.insert("degree".into(), json!("PhD"));
    assert_eq!(forged.id, vc.id);
    assert_eq!(current_status(&forged, &tracker, Utc::now()), CredentialStatus::Pending);
    assert_eq!(current_status(&vc, &tracker, Utc::now()), CredentialStatus::Verified);
}

#[tokio::test]
async fn test_expired_is_terminal() {
    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);
    let engine = VerificationEngine::new();
    let tracker = StatusTracker::new();

    let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let expiry = issued_at + Duration::days(30);
    let vc = issuer
        .issue_at(&holder(), "Membership", Claims::new(), Some(expiry), issued_at)
        .unwrap();

    let (_, status) = engine
        .verify_and_track(&vc, &resolver, &tracker, issued_at + Duration::days(1))
        .await;
    assert_eq!(status, CredentialStatus::Verified);

    let (outcome, status) = engine
        .verify_and_track(&vc, &resolver, &tracker, expiry)
        .await;
    assert_eq!(outcome, VerificationOutcome::Expired);
    assert_eq!(status, CredentialStatus::Expired);

    // A clock moved backwards does not revive it.
    let (outcome, status) = engine
        .verify_and_track(&vc, &resolver, &tracker, issued_at + Duration::days(2))
        .await;
    assert_eq!(outcome, VerificationOutcome::Expired);
    assert_eq!(status, CredentialStatus::Expired);
}

#[tokio::test]
async fn test_revocation_hook() {
    struct RevokedTypes(Vec<String>);

    impl RevocationCheck for RevokedTypes {
        fn is_revoked(&self, credential: &VerifiableCredential) -> bool {
            self.0.contains(&credential.credential_type)
        }
    }

    let resolver = LocalDidResolver::new();
    let issuer = create_issuer(&resolver);
    let revoked_types = RevokedTypes(vec!["Membership".into()]);
    let engine = VerificationEngine::with_revocation(Arc::new(revoked_types));

    let revoked = issuer.issue(&holder(), "Membership", Claims::new(), None).unwrap();
    let fine = issuer.issue(&holder(), "Employment", Claims::new(), None).unwrap();

    assert_eq!(
        engine.verify(&revoked, &resolver, Utc::now()).await,
        VerificationOutcome::Revoked
    );
    assert!(engine.verify(&fine, &resolver, Utc::now()).await.is_valid());
}
