//! Integration test: identity creation through credential verification.
//!
//! Generates a key, derives a `did:key`, publishes and anchors its document,
//! then issues and verifies credentials against the anchored document.

use chrono::{Duration, Utc};
use serde_json::json;

use credo_agent::{IdentityService, Stage};
use credo_anchor::{
    ConfirmationMode, ContentStore, FallbackContentStore, LocalCache, MemoryContentStore,
    MemoryLedger, RegistryAnchor,
};
use credo_core::{CredentialStatus, DidMethod};
use credo_credentials::{Claims, VerificationOutcome};
use credo_crypto::KeyPair;
use credo_identity::{DidDeriver, DidResolver, DocumentBuilder, IdentityDocument};

type Service = IdentityService<MemoryContentStore, MemoryLedger>;

async fn service(dir: &tempfile::TempDir) -> Service {
    let cache = LocalCache::open(dir.path().join("cache")).await.unwrap();
    IdentityService::new(
        FallbackContentStore::new(MemoryContentStore::new(), cache),
        RegistryAnchor::new(MemoryLedger::new(ConfirmationMode::Immediate)),
    )
}

fn degree() -> Claims {
    let mut claims = Claims::new();
    claims.insert("degree".into(), json!("BSc"));
    claims
}

// =========================================================================
// Manual walk through every layer
// =========================================================================

#[tokio::test]
async fn test_layers_compose_by_hand() {
    let dir = tempfile::tempdir().unwrap();
    let cache = LocalCache::open(dir.path()).await.unwrap();
    let store = FallbackContentStore::new(MemoryContentStore::new(), cache);
    let registry = RegistryAnchor::new(MemoryLedger::default());

    // Key → DID → document
    let kp = KeyPair::generate().unwrap();
    let did = DidDeriver::derive(&kp.public_key(), DidMethod::Key, None).unwrap();
    let jwk = kp.public_key().to_jwk();
    assert_eq!(did.as_str(), format!("did:key:z{}", &format!("{}{}", jwk.x, jwk.y)[..32]));
    let document = DocumentBuilder::build(&did, jwk);
    assert_eq!(document.verification_method[0].id, format!("{}#key-1", did));

    // Publish → anchor → lookup → fetch
    let published = store.publish(&document.to_json_vec().unwrap()).await.unwrap();
    assert!(!published.degraded);
    let receipt = registry
        .register(did.as_str(), &did, &published.address)
        .await
        .unwrap();

    let record = registry.lookup(did.as_str()).await.unwrap();
    assert_eq!(record.did, did);
    assert_eq!(record.content_address, published.address);

    let bytes = store.get(&record.content_address).await.unwrap();
    assert_eq!(IdentityDocument::from_json(&bytes).unwrap(), document);

    // Same record again: no new ledger entry, same receipt.
    let again = registry
        .register(did.as_str(), &did, &published.address)
        .await
        .unwrap();
    assert_eq!(again.tx_ref, receipt.tx_ref);
    assert_eq!(registry.ledger().entries().await.len(), 1);
}

// =========================================================================
// Issue and verify through the service
// =========================================================================

#[tokio::test]
async fn test_issue_and_verify_education_certificate() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    let issuer = svc.create_identity(None).await.unwrap();
    let holder = svc.create_identity(None).await.unwrap();

    let vc = issuer
        .issuer()
        .unwrap()
        .issue(&holder.did, "Education Certificate", degree(), None)
        .unwrap();
    assert_eq!(vc.issuer, issuer.did);
    assert_eq!(vc.claims["degree"], "BSc");

    let (outcome, status) = svc.verify_credential(&vc, Utc::now()).await;
    assert_eq!(
        outcome,
        VerificationOutcome::Valid {
            method_id: issuer.did.with_fragment("key-1")
        }
    );
    assert_eq!(status, CredentialStatus::Verified);
}

#[tokio::test]
async fn test_past_expiry_verifies_as_expired() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    let issuer = svc.create_identity(None).await.unwrap();
    let holder = svc.create_identity(None).await.unwrap();

    let vc = issuer
        .issuer()
        .unwrap()
        .issue(
            &holder.did,
            "Education Certificate",
            degree(),
            Some(Utc::now() - Duration::days(1)),
        )
        .unwrap();

    let (outcome, status) = svc.verify_credential(&vc, Utc::now()).await;
    assert_eq!(outcome, VerificationOutcome::Expired);
    assert_eq!(status, CredentialStatus::Expired);
}

#[tokio::test]
async fn test_tampered_claims_fail_signature_check() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    let issuer = svc.create_identity(None).await.unwrap();
    let holder = svc.create_identity(None).await.unwrap();

    let mut vc = issuer
        .issuer()
        .unwrap()
        .issue(&holder.did, "Education Certificate", degree(), None)
        .unwrap();
    vc.claims.insert("degree".into(), json!("PhD"));

    let (outcome, status) = svc.verify_credential(&vc, Utc::now()).await;
    assert_eq!(outcome, VerificationOutcome::SignatureMismatch);
    assert_eq!(status, CredentialStatus::Pending);
}

#[tokio::test]
async fn test_unanchored_issuer_is_unresolvable() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    let holder = svc.create_identity(None).await.unwrap();

    let stranger = KeyPair::generate().unwrap();
    let stranger_did = DidDeriver::key_did(&stranger.public_key());
    let vc = credo_credentials::CredentialIssuer::new(stranger_did, stranger)
        .issue(&holder.did, "Education Certificate", degree(), None)
        .unwrap();

    let (outcome, _) = svc.verify_credential(&vc, Utc::now()).await;
    assert!(matches!(outcome, VerificationOutcome::IssuerUnresolvable { .. }));
}

// =========================================================================
// Outages
// =========================================================================

#[tokio::test]
async fn test_store_outage_then_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    svc.store().remote().set_offline(true);

    let mut issuer = svc.create_identity(None).await.unwrap();
    assert!(issuer.degraded);
    assert!(issuer.content_address.to_string().starts_with("local_"));

    // Still resolvable from the local cache.
    let resolved = svc.resolver().resolve(&issuer.did).await.unwrap();
    assert_eq!(resolved, issuer.document);

    svc.store().remote().set_offline(false);
    assert!(svc.republish(&mut issuer).await.unwrap());
    assert!(!issuer.degraded);
    let record = svc.registry().lookup(&issuer.owner).await.unwrap();
    assert_eq!(record.content_address, issuer.content_address);
}

#[tokio::test]
async fn test_ledger_outage_then_resume() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    svc.registry().ledger().set_offline(true);

    let failed = svc.create_identity(None).await.unwrap_err();
    assert_eq!(failed.stage, Stage::Anchoring);
    let draft = failed.draft.unwrap();

    svc.registry().ledger().set_offline(false);
    let identity = svc.resume(*draft).await.unwrap();
    assert_eq!(
        svc.resolver().resolve(&identity.did).await.unwrap(),
        identity.document
    );
}

// =========================================================================
// Persistence and rotation
// =========================================================================

#[tokio::test]
async fn test_persisted_identity_keeps_issuing() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    let path = dir.path().join("bundle").join("identity.json");

    let created = svc.load_or_create(&path, None).await.unwrap();
    let reloaded = credo_agent::Identity::load(&path).unwrap();
    assert_eq!(reloaded.did, created.did);

    let holder = svc.create_identity(None).await.unwrap();
    let vc = reloaded
        .issuer()
        .unwrap()
        .issue(&holder.did, "Education Certificate", degree(), None)
        .unwrap();
    let (outcome, _) = svc.verify_credential(&vc, Utc::now()).await;
    assert!(outcome.is_valid());
}

#[tokio::test]
async fn test_rotation_updates_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir).await;
    let mut identity = svc.create_identity(None).await.unwrap();
    let first_address = identity.content_address.clone();

    svc.rotate_key(&mut identity).await.unwrap();

    let record = svc.registry().lookup(&identity.owner).await.unwrap();
    assert_ne!(record.content_address, first_address);
    assert_eq!(record.content_address, identity.content_address);
    let resolved = svc.resolver().resolve(&identity.did).await.unwrap();
    assert_eq!(resolved.created, identity.document.created);
    assert_eq!(resolved.verification_method.len(), 1);
}
