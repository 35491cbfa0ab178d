use async_trait::async_trait;
use dashmap::DashMap;

use credo_core::Did;

use crate::document::IdentityDocument;
use crate::error::IdentityError;

/// Trait for resolving DIDs to their identity documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID to its current identity document.
    async fn resolve(&self, did: &Did) -> Result<IdentityDocument, IdentityError>;
}

/// Resolves DIDs from an in-memory table of known documents.
#[derive(Default)]
pub struct LocalDidResolver {
    documents: DashMap<Did, IdentityDocument>,
}

impl LocalDidResolver {
    /// Create an empty local resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the document for its DID.
    pub fn insert(&self, document: IdentityDocument) {
        self.documents.insert(document.id.clone(), document);
    }

    /// Forget a DID. Returns whether it was known.
    pub fn remove(&self, did: &Did) -> bool {
        self.documents.remove(did).is_some()
    }

    /// Number of known documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DidResolver for LocalDidResolver {
    async fn resolve(&self, did: &Did) -> Result<IdentityDocument, IdentityError> {
        self.documents
            .get(did)
            .map(|doc| doc.value().clone())
            .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))
    }
}

/// Composite resolver that tries multiple resolvers in order.
///
/// Returns the first successful resolution, or the last error.
pub struct CompositeDidResolver {
    resolvers: Vec<Box<dyn DidResolver>>,
}

impl CompositeDidResolver {
    /// Create a new composite resolver with no backends.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Add a resolver to the chain.
    pub fn add_resolver(&mut self, resolver: Box<dyn DidResolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of registered resolvers.
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

impl Default for CompositeDidResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DidResolver for CompositeDidResolver {
    async fn resolve(&self, did: &Did) -> Result<IdentityDocument, IdentityError> {
        let mut last_error = IdentityError::DidResolution("no resolvers configured".into());

        for resolver in &self.resolvers {
            match resolver.resolve(did).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    tracing::debug!(did = %did, error = %e, "resolver failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credo_crypto::KeyPair;

    use crate::did::DidDeriver;
    use crate::document::DocumentBuilder;

    fn document() -> IdentityDocument {
        let kp = KeyPair::generate().unwrap();
        let did = DidDeriver::key_did(&kp.public_key());
        DocumentBuilder::build(&did, kp.public_key().to_jwk())
    }

    #[tokio::test]
    async fn test_local_resolver_found() {
        let resolver = LocalDidResolver::new();
        let doc = document();
        resolver.insert(doc.clone());

        let resolved = resolver.resolve(&doc.id).await.unwrap();
        assert_eq!(resolved, doc);
        assert_eq!(resolver.len(), 1);
    }

    #[tokio::test]
    async fn test_local_resolver_not_found() {
        let resolver = LocalDidResolver::new();
        let did = Did::parse("did:key:zNonexistent").unwrap();
        let result = resolver.resolve(&did).await;
        assert!(matches!(result, Err(IdentityError::DidNotFound(_))));
    }

    #[tokio::test]
    async fn test_local_resolver_remove() {
        let resolver = LocalDidResolver::new();
        let doc = document();
        resolver.insert(doc.clone());
        assert!(resolver.remove(&doc.id));
        assert!(resolver.is_empty());
        assert!(resolver.resolve(&doc.id).await.is_err());
    }

    #[tokio::test]
    async fn test_composite_resolver_first_succeeds() {
        let local = LocalDidResolver::new();
        let doc = document();
        local.insert(doc.clone());

        let mut composite = CompositeDidResolver::new();
        composite.add_resolver(Box::new(local));
        assert_eq!(composite.resolver_count(), 1);

        let resolved = composite.resolve(&doc.id).await.unwrap();
        assert_eq!(resolved.id, doc.id);
    }

    #[tokio::test]
    async fn test_composite_resolver_fallback() {
        let full = LocalDidResolver::new();
        let doc = document();
        full.insert(doc.clone());

        let mut composite = CompositeDidResolver::new();
        composite.add_resolver(Box::new(LocalDidResolver::new())); // will fail
        composite.add_resolver(Box::new(full)); // will succeed

        let resolved = composite.resolve(&doc.id).await.unwrap();
        assert_eq!(resolved.id, doc.id);
    }

    #[tokio::test]
    async fn test_composite_resolver_all_fail() {
        let mut composite = CompositeDidResolver::new();
        composite.add_resolver(Box::new(LocalDidResolver::new()));
        composite.add_resolver(Box::new(LocalDidResolver::new()));

        let did = Did::parse("did:key:zUnknown").unwrap();
        let result = composite.resolve(&did).await;
        assert!(matches!(result, Err(IdentityError::DidNotFound(_))));
    }

    #[tokio::test]
    async fn test_composite_resolver_empty() {
        let composite = CompositeDidResolver::default();
        let did = Did::parse("did:key:zUnknown").unwrap();
        let result = composite.resolve(&did).await;
        assert!(matches!(result, Err(IdentityError::DidResolution(_))));
    }
}
