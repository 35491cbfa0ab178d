use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use credo_core::Did;
use credo_crypto::{PublicJwk, PublicKey};

use crate::error::IdentityError;

/// Base DID Core JSON-LD context.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
/// JSON Web Signature 2020 suite context (for `publicKeyJwk` methods).
pub const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";
/// Verification method type for JWK-encoded keys.
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// What a verification method is authorised to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodPurpose {
    /// Proving control of the DID.
    Authentication,
    /// Signing claims, such as issued credentials.
    Assertion,
}

/// Both purposes; the default for a holder's own key.
pub const ALL_PURPOSES: [MethodPurpose; 2] =
    [MethodPurpose::Authentication, MethodPurpose::Assertion];

/// A verification method within an identity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Method identifier (e.g., "did:key:zAbc#key-1").
    pub id: String,
    /// Type of the verification method (e.g., "JsonWebKey2020").
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: Did,
    /// Public key interchange record.
    pub public_key_jwk: PublicJwk,
}

impl VerificationMethod {
    /// A `JsonWebKey2020` method with id `<controller>#<fragment>`.
    pub fn json_web_key(controller: &Did, fragment: &str, public_key_jwk: PublicJwk) -> Self {
        Self {
            id: controller.with_fragment(fragment),
            method_type: JSON_WEB_KEY_2020.to_string(),
            controller: controller.clone(),
            public_key_jwk,
        }
    }

    /// Decode the method's public key.
    pub fn public_key(&self) -> Result<PublicKey, IdentityError> {
        Ok(PublicKey::from_jwk(&self.public_key_jwk)?)
    }
}

/// Machine-readable binding of a DID to its verification material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The DID subject.
    pub id: Did,
    /// Verification methods, in insertion order.
    pub verification_method: Vec<VerificationMethod>,
    /// Method ids authorised for authentication.
    pub authentication: Vec<String>,
    /// Method ids authorised for claim assertion.
    pub assertion_method: Vec<String>,
    /// When the document was created.
    pub created: DateTime<Utc>,
    /// When the document was last updated.
    pub updated: DateTime<Utc>,
}

impl IdentityDocument {
    /// Check the document's structural invariants: method ids are unique and
    /// every authentication/assertion reference names an existing method.
    pub fn validate(&self) -> Result<(), IdentityError> {
        let mut ids = HashSet::new();
        for vm in &self.verification_method {
            if !ids.insert(vm.id.as_str()) {
                return Err(IdentityError::InvalidDocument(format!(
                    "duplicate verification method id {}",
                    vm.id
                )));
            }
        }
        for reference in self.authentication.iter().chain(&self.assertion_method) {
            if !ids.contains(reference.as_str()) {
                return Err(IdentityError::InvalidDocument(format!(
                    "reference {} has no verification method",
                    reference
                )));
            }
        }
        if self.updated < self.created {
            return Err(IdentityError::InvalidDocument(
                "updated precedes created".into(),
            ));
        }
        Ok(())
    }

    /// Look up a verification method by id.
    pub fn method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// Methods referenced by the assertion list, in list order.
    pub fn assertion_methods(&self) -> impl Iterator<Item = &VerificationMethod> {
        self.assertion_method.iter().filter_map(|id| self.method(id))
    }

    /// Methods referenced by the authentication list, in list order.
    pub fn authentication_methods(&self) -> impl Iterator<Item = &VerificationMethod> {
        self.authentication.iter().filter_map(|id| self.method(id))
    }

    /// The next unused `#key-N` method id for this document.
    pub fn next_method_id(&self) -> String {
        let mut n = self.verification_method.len() + 1;
        loop {
            let candidate = self.id.with_fragment(&format!("key-{}", n));
            if self.method(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Serialize as pretty JSON, the form published to the content store.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, IdentityError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse and validate a document fetched from storage.
    pub fn from_json(bytes: &[u8]) -> Result<Self, IdentityError> {
        let doc: Self = serde_json::from_slice(bytes)?;
        doc.validate()?;
        Ok(doc)
    }
}

/// Constructs and evolves identity documents.
pub struct DocumentBuilder;

impl DocumentBuilder {
    /// Build a document with a single `#key-1` method used for both
    /// authentication and assertion.
    pub fn build(did: &Did, public_key_jwk: PublicJwk) -> IdentityDocument {
        Self::build_at(did, public_key_jwk, Utc::now())
    }

    /// [`DocumentBuilder::build`] with an explicit creation time.
    pub fn build_at(did: &Did, public_key_jwk: PublicJwk, now: DateTime<Utc>) -> IdentityDocument {
        let vm = VerificationMethod::json_web_key(did, "key-1", public_key_jwk);
        let vm_id = vm.id.clone();
        IdentityDocument {
            context: vec![DID_CONTEXT.to_string(), JWS_2020_CONTEXT.to_string()],
            id: did.clone(),
            verification_method: vec![vm],
            authentication: vec![vm_id.clone()],
            assertion_method: vec![vm_id],
            created: now,
            updated: now,
        }
    }

    /// Append a new method for both purposes, or replace an existing method
    /// with the same id. Bumps `updated`; `created` and the DID never change.
    pub fn update(
        existing: &IdentityDocument,
        method: VerificationMethod,
    ) -> Result<IdentityDocument, IdentityError> {
        Self::update_with_purposes(existing, method, &ALL_PURPOSES, Utc::now())
    }

    /// [`DocumentBuilder::update`] with explicit purposes and time. Purposes
    /// apply only to newly appended methods; a replaced method keeps its own.
    pub fn update_with_purposes(
        existing: &IdentityDocument,
        method: VerificationMethod,
        purposes: &[MethodPurpose],
        now: DateTime<Utc>,
    ) -> Result<IdentityDocument, IdentityError> {
        if method.controller != existing.id {
            return Err(IdentityError::InvalidDocument(format!(
                "method controller {} does not match document {}",
                method.controller, existing.id
            )));
        }
        if !method.id.starts_with(&format!("{}#", existing.id)) {
            return Err(IdentityError::InvalidDocument(format!(
                "method id {} is not a fragment of {}",
                method.id, existing.id
            )));
        }
        method.public_key()?;

        let mut doc = existing.clone();
        match doc.verification_method.iter_mut().find(|vm| vm.id == method.id) {
            Some(slot) => *slot = method,
            None => {
                let id = method.id.clone();
                doc.verification_method.push(method);
                if purposes.contains(&MethodPurpose::Authentication) {
                    doc.authentication.push(id.clone());
                }
                if purposes.contains(&MethodPurpose::Assertion) {
                    doc.assertion_method.push(id);
                }
            }
        }
        doc.updated = now.max(existing.updated);
        Ok(doc)
    }

    /// Remove a method and every reference to it. The last assertion method
    /// cannot be removed.
    pub fn revoke_method(
        existing: &IdentityDocument,
        method_id: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentityDocument, IdentityError> {
        if existing.method(method_id).is_none() {
            return Err(IdentityError::MethodNotFound(method_id.to_string()));
        }
        let mut doc = existing.clone();
        doc.verification_method.retain(|vm| vm.id != method_id);
        doc.authentication.retain(|id| id != method_id);
        doc.assertion_method.retain(|id| id != method_id);
        if doc.assertion_method.is_empty() {
            return Err(IdentityError::InvalidDocument(
                "document must keep at least one assertion method".into(),
            ));
        }
        doc.updated = now.max(existing.updated);
        Ok(doc)
    }
}
