use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use super::{store::Store, ServiceError};
use crate::models::{ApiKey, User};
use crate::utils::{hash_secret, verify_secret, Secret, SecretHash};

/// Random bytes behind every raw key (256 bits).
pub const API_KEY_BYTES: usize = 32;

/// Result of [`ApiKeyService::generate`]. `raw_key` is handed to the caller
/// once and exists nowhere else.
#[derive(Debug)]
pub struct GeneratedApiKey {
    pub record: ApiKey,
    pub raw_key: Secret,
}

/// A raw key that matched an active record.
#[derive(Debug, Clone)]
pub struct ApiKeyIdentity {
    pub key_id: Uuid,
    pub owner: User,
}

#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn Store>,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn generate(&self, owner_id: Uuid, name: String) -> Result<GeneratedApiKey, ServiceError> {
        let raw_key = Secret::new(generate_random_encoded_bytes(API_KEY_BYTES));

        let to_hash = raw_key.clone();
        let hash = tokio::task::spawn_blocking(move || hash_secret(&to_hash))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))??;

        let record = ApiKey::new(owner_id, name, hash.into_string());
        self.store.insert_api_key(&record).await?;

        tracing::info!(key_id = %record.id, user_id = %owner_id, "API key generated");

        Ok(GeneratedApiKey { record, raw_key })
    }

    /// Resolve a raw key to its owner.
    ///
    /// Hashes are salted, so there is no lookup by value: every active record
    /// is verified in turn until one matches. Cost grows linearly with the
    /// number of active keys. `Ok(None)` means nothing matched.
    pub async fn validate(&self, raw_key: &Secret) -> Result<Option<ApiKeyIdentity>, ServiceError> {
        let active = self.store.list_active_api_keys().await?;
        let candidate = raw_key.clone();

        let matched = tokio::task::spawn_blocking(move || {
            active
                .into_iter()
                .find(|key| verify_secret(&candidate, &SecretHash::new(key.key_hash.as_str())))
        })
        .await
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Key verification task failed: {}", e)))?;

        let Some(key) = matched else {
            return Ok(None);
        };

        let owner = self.store.find_user_by_id(key.user_id).await?;
        Ok(owner.map(|owner| ApiKeyIdentity {
            key_id: key.id,
            owner,
        }))
    }

    /// All keys of `owner_id`, revoked ones included.
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<ApiKey>, ServiceError> {
        Ok(self.store.list_api_keys(owner_id).await?)
    }

    /// Deactivate a key. A key that is absent, already revoked or owned by
    /// someone else is reported as not found.
    pub async fn revoke(&self, key_id: Uuid, owner_id: Uuid) -> Result<(), ServiceError> {
        let affected = self.store.set_api_key_inactive(key_id, owner_id).await?;
        if affected == 0 {
            return Err(ServiceError::NotFound("API key"));
        }

        tracing::info!(key_id = %key_id, user_id = %owner_id, "API key revoked");
        Ok(())
    }
}

fn generate_random_encoded_bytes(size: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut bytes = vec![0u8; size];
    rng.fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    async fn setup() -> (ApiKeyService, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let owner = User::new("ops@example.com".to_string(), "unused".to_string());
        store.insert_user(&owner).await.unwrap();
        (ApiKeyService::new(store.clone()), store, owner)
    }

    #[test]
    fn test_raw_key_encoding() {
        let raw = generate_random_encoded_bytes(API_KEY_BYTES);
        assert_eq!(URL_SAFE_NO_PAD.decode(&raw).unwrap().len(), API_KEY_BYTES);
        assert_ne!(raw, generate_random_encoded_bytes(API_KEY_BYTES));
    }

    #[tokio::test]
    async fn test_generated_key_validates_until_revoked() {
        let (service, _, owner) = setup().await;
        let generated = service.generate(owner.id, "ci-bot".to_string()).await.unwrap();

        assert!(generated.record.is_active);
        assert_ne!(generated.record.key_hash, generated.raw_key.expose());

        let identity = service.validate(&generated.raw_key).await.unwrap().unwrap();
        assert_eq!(identity.owner.id, owner.id);
        assert_eq!(identity.key_id, generated.record.id);

        service.revoke(generated.record.id, owner.id).await.unwrap();
        assert!(service.validate(&generated.raw_key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_key_matches_nothing() {
        let (service, _, owner) = setup().await;
        for name in ["one", "two", "three"] {
            service.generate(owner.id, name.to_string()).await.unwrap();
        }

        let wrong = Secret::new(generate_random_encoded_bytes(API_KEY_BYTES));
        assert!(service.validate(&wrong).await.unwrap().is_none());
        assert!(service.validate(&Secret::new("")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_each_key_resolves_to_its_own_record() {
        let (service, _, owner) = setup().await;
        let first = service.generate(owner.id, "first".to_string()).await.unwrap();
        let second = service.generate(owner.id, "second".to_string()).await.unwrap();

        let resolved = service.validate(&second.raw_key).await.unwrap().unwrap();
        assert_eq!(resolved.key_id, second.record.id);
        let resolved = service.validate(&first.raw_key).await.unwrap().unwrap();
        assert_eq!(resolved.key_id, first.record.id);
    }

    #[tokio::test]
    async fn test_malformed_stored_hash_is_skipped() {
        let (service, store, owner) = setup().await;
        store
            .insert_api_key(&ApiKey::new(owner.id, "broken".to_string(), "garbage".to_string()))
            .await
            .unwrap();
        let good = service.generate(owner.id, "good".to_string()).await.unwrap();

        let resolved = service.validate(&good.raw_key).await.unwrap().unwrap();
        assert_eq!(resolved.key_id, good.record.id);
    }

    #[tokio::test]
    async fn test_revoke_is_owner_scoped() {
        let (service, _, owner) = setup().await;
        let generated = service.generate(owner.id, "ci-bot".to_string()).await.unwrap();

        let stranger = Uuid::new_v4();
        assert!(matches!(
            service.revoke(generated.record.id, stranger).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.validate(&generated.raw_key).await.unwrap().is_some());

        service.revoke(generated.record.id, owner.id).await.unwrap();
        assert!(matches!(
            service.revoke(generated.record.id, owner.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.revoke(Uuid::new_v4(), owner.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_keeps_revoked_keys() {
        let (service, _, owner) = setup().await;
        let revoked = service.generate(owner.id, "old".to_string()).await.unwrap();
        service.generate(owner.id, "new".to_string()).await.unwrap();
        service.revoke(revoked.record.id, owner.id).await.unwrap();

        let keys = service.list(owner.id).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.iter().filter(|k| k.is_active).count(), 1);
        assert!(service.list(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
