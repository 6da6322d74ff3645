use std::sync::Arc;

use tracing::info;

use crate::repository::{KeyValueStore, StorageError};

const AUTHORIZED: &str = "true";

/// Signup gate guarding the course view.
///
/// The flag is set by a successful signup; the course may only be opened when
/// the stored value is exactly `"true"`.
#[derive(Clone)]
pub struct AuthorizationGate {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the flag cannot be read.
    pub async fn is_authorized(&self) -> Result<bool, StorageError> {
        let value = self.kv.get(&self.key).await?;
        Ok(value.as_deref() == Some(AUTHORIZED))
    }

    /// Record a completed signup.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the flag cannot be written.
    pub async fn grant(&self) -> Result<(), StorageError> {
        self.kv.set(&self.key, AUTHORIZED).await?;
        info!(key = %self.key, "course access granted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the flag cannot be removed.
    pub async fn revoke(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryKeyValueStore;

    #[tokio::test]
    async fn only_literal_true_authorizes() {
        let kv = InMemoryKeyValueStore::new();
        let gate = AuthorizationGate::new(Arc::new(kv.clone()), "auth");
        assert!(!gate.is_authorized().await.unwrap());

        for value in ["TRUE", "1", "yes", " true"] {
            kv.set("auth", value).await.unwrap();
            assert!(!gate.is_authorized().await.unwrap(), "value {value:?}");
        }

        kv.set("auth", "true").await.unwrap();
        assert!(gate.is_authorized().await.unwrap());
    }

    #[tokio::test]
    async fn grant_and_revoke() {
        let gate = AuthorizationGate::new(Arc::new(InMemoryKeyValueStore::new()), "auth");
        gate.grant().await.unwrap();
        assert!(gate.is_authorized().await.unwrap());
        gate.revoke().await.unwrap();
        assert!(!gate.is_authorized().await.unwrap());
    }
}
