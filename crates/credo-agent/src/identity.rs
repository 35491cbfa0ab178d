//! Identity bundle and in-progress identity drafts.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use credo_anchor::{ContentAddress, Published, Receipt};
use credo_core::Did;
use credo_credentials::CredentialIssuer;
use credo_crypto::{CryptoError, KeyPair, PrivateJwk};
use credo_identity::IdentityDocument;

use crate::error::{AgentError, Stage};

/// A fully created identity: key material, document, and where the
/// document is published and anchored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub did: Did,
    /// Registry owner the DID is anchored under.
    pub owner: String,
    pub(crate) private_key: PrivateJwk,
    pub document: IdentityDocument,
    pub content_address: ContentAddress,
    /// The document is held only in the local cache.
    pub degraded: bool,
    pub receipt: Receipt,
}

impl Identity {
    /// Reconstruct the signing key pair.
    pub fn keypair(&self) -> Result<KeyPair, CryptoError> {
        KeyPair::import_private(&self.private_key)
    }

    /// A credential issuer signing as this identity.
    pub fn issuer(&self) -> Result<CredentialIssuer, CryptoError> {
        Ok(CredentialIssuer::new(self.did.clone(), self.keypair()?))
    }

    /// Write the bundle, private key included, as JSON.
    pub fn persist(&self, path: &Path) -> anyhow::Result<()> {
        let contents = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write identity bundle {}", path.display()))?;
        tracing::info!(did = %self.did, path = %path.display(), "identity persisted");
        Ok(())
    }

    /// Read a bundle written by [`Identity::persist`], checking that the
    /// key material is intact.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read(path)
            .with_context(|| format!("failed to read identity bundle {}", path.display()))?;
        let identity: Identity = serde_json::from_slice(&contents)?;
        identity
            .keypair()
            .map_err(|e| anyhow::anyhow!("identity bundle holds invalid key material: {}", e))?;
        identity.document.validate()?;
        tracing::info!(did = %identity.did, path = %path.display(), "identity loaded");
        Ok(identity)
    }
}

/// An identity whose creation has not finished.
#[derive(Debug)]
pub struct IdentityDraft {
    pub(crate) keypair: KeyPair,
    pub(crate) did: Did,
    pub(crate) owner: String,
    pub(crate) document: IdentityDocument,
    pub(crate) published: Option<Published>,
    pub(crate) receipt: Option<Receipt>,
}

impl IdentityDraft {
    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn document(&self) -> &IdentityDocument {
        &self.document
    }

    pub fn published(&self) -> Option<&Published> {
        self.published.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// The next stage to run, or `None` when the draft is complete.
    pub fn next_stage(&self) -> Option<Stage> {
        if self.published.is_none() {
            Some(Stage::Publication)
        } else if self.receipt.is_none() {
            Some(Stage::Anchoring)
        } else {
            None
        }
    }

    /// Finish a complete draft.
    pub fn into_identity(self) -> Result<Identity, AgentError> {
        let published = self
            .published
            .ok_or(AgentError::StageIncomplete(Stage::Publication))?;
        let receipt = self
            .receipt
            .ok_or(AgentError::StageIncomplete(Stage::Anchoring))?;
        Ok(Identity {
            did: self.did,
            owner: self.owner,
            private_key: self.keypair.export_private(),
            document: self.document,
            content_address: published.address,
            degraded: published.degraded,
            receipt,
        })
    }
}
