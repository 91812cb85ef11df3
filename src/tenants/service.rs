use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::{IdentityError, IdentityProvider, NewUser};

use super::store::{TenantStore, TenantStoreError};
use super::TenantRecord;

pub struct NewTenant {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub tenant_name: String,
    pub tenant_tier: String,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Invalid(String),
    #[error("identity creation failed: {0}")]
    Identity(#[from] IdentityError),
    #[error("tenant metadata write failed: {0}")]
    Metadata(#[from] TenantStoreError),
}

/// Two-step tenant sign-up: identity record first, metadata record
/// second. The steps share no transaction; a metadata failure leaves the
/// identity record behind as a documented orphan for the reconciliation
/// runbook, never rolled back here.
#[derive(Clone)]
pub struct TenantRegistrationService {
    identity: Arc<dyn IdentityProvider>,
    tenants: Arc<dyn TenantStore>,
}

impl TenantRegistrationService {
    pub fn new(identity: Arc<dyn IdentityProvider>, tenants: Arc<dyn TenantStore>) -> Self {
        Self { identity, tenants }
    }

    pub async fn register(&self, tenant: &NewTenant) -> Result<Uuid, RegistrationError> {
        validate(tenant).map_err(RegistrationError::Invalid)?;

        let tenant_id = Uuid::new_v4();

        self.identity
            .create_user(NewUser {
                email: &tenant.email,
                given_name: &tenant.given_name,
                family_name: &tenant.family_name,
                tenant_id,
            })
            .await?;
        tracing::info!(%tenant_id, "created identity record");

        let record = TenantRecord {
            tenant_id,
            tenant_name: tenant.tenant_name.clone(),
            tenant_tier: tenant.tenant_tier.clone(),
            fullname: format!("{} {}", tenant.given_name, tenant.family_name),
        };

        if let Err(err) = self.tenants.create(&record).await {
            tracing::error!(
                %tenant_id,
                email = %tenant.email,
                error = %err,
                "metadata write failed after identity creation, identity record is orphaned"
            );
            return Err(err.into());
        }
        tracing::info!(%tenant_id, "tenant metadata written");

        Ok(tenant_id)
    }
}

fn validate(tenant: &NewTenant) -> Result<(), String> {
    if tenant.given_name.trim().is_empty() || tenant.family_name.trim().is_empty() {
        return Err("given_name and family_name are required".to_string());
    }

    if !tenant.email.contains('@') {
        return Err("email is not valid".to_string());
    }

    if tenant.tenant_name.trim().is_empty() {
        return Err("tenant_name is required".to_string());
    }

    if tenant.tenant_tier.trim().is_empty() {
        return Err("tenant_tier is required".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthenticatedUser;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingIdentity {
        duplicate_email: Option<String>,
        created: Mutex<Vec<String>>,
    }

    impl RecordingIdentity {
        fn accepting() -> Self {
            Self {
                duplicate_email: None,
                created: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(email: &str) -> Self {
            Self {
                duplicate_email: Some(email.to_string()),
                created: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for RecordingIdentity {
        async fn create_user(&self, user: NewUser<'_>) -> Result<(), IdentityError> {
            if self.duplicate_email.as_deref() == Some(user.email) {
                return Err(IdentityError::DuplicateEmail(user.email.to_string()));
            }
            self.created.lock().unwrap().push(user.email.to_string());
            Ok(())
        }

        async fn verify_credentials(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<Option<AuthenticatedUser>, IdentityError> {
            Ok(None)
        }
    }

    struct RecordingStore {
        conflict: bool,
        created: Mutex<Vec<TenantRecord>>,
    }

    impl RecordingStore {
        fn accepting() -> Self {
            Self {
                conflict: false,
                created: Mutex::new(Vec::new()),
            }
        }

        fn conflicting() -> Self {
            Self {
                conflict: true,
                created: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TenantStore for RecordingStore {
        async fn create(&self, record: &TenantRecord) -> Result<(), TenantStoreError> {
            if self.conflict {
                return Err(TenantStoreError::Conflict(record.tenant_id));
            }
            self.created.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn get(&self, _tenant_id: Uuid) -> Result<Option<TenantRecord>, TenantStoreError> {
            Ok(None)
        }
    }

    fn new_tenant() -> NewTenant {
        NewTenant {
            given_name: "Ada".to_string(),
            family_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            tenant_name: "Analytical Engines".to_string(),
            tenant_tier: "premium".to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_identity_then_metadata() {
        let identity = Arc::new(RecordingIdentity::accepting());
        let store = Arc::new(RecordingStore::accepting());
        let service = TenantRegistrationService::new(identity.clone(), store.clone());

        let tenant_id = service.register(&new_tenant()).await.unwrap();

        assert_eq!(
            identity.created.lock().unwrap().as_slice(),
            ["ada@example.com"]
        );

        let records = store.created.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tenant_id, tenant_id);
        assert_eq!(records[0].fullname, "Ada Lovelace");
        assert_eq!(records[0].tenant_tier, "premium");
    }

    #[tokio::test]
    async fn each_registration_gets_its_own_tenant_id() {
        let service = TenantRegistrationService::new(
            Arc::new(RecordingIdentity::accepting()),
            Arc::new(RecordingStore::accepting()),
        );

        let first = service.register(&new_tenant()).await.unwrap();
        let second = service.register(&new_tenant()).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn duplicate_email_fails_before_any_metadata_write() {
        let store = Arc::new(RecordingStore::accepting());
        let service = TenantRegistrationService::new(
            Arc::new(RecordingIdentity::rejecting("ada@example.com")),
            store.clone(),
        );

        let err = service.register(&new_tenant()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Identity(IdentityError::DuplicateEmail(_))
        ));
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_conflict_surfaces_and_leaves_the_identity_record() {
        let identity = Arc::new(RecordingIdentity::accepting());
        let service = TenantRegistrationService::new(
            identity.clone(),
            Arc::new(RecordingStore::conflicting()),
        );

        let err = service.register(&new_tenant()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Metadata(TenantStoreError::Conflict(_))
        ));

        // No compensation: the identity side effect stays
        assert_eq!(identity.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_incomplete_input() {
        let service = TenantRegistrationService::new(
            Arc::new(RecordingIdentity::accepting()),
            Arc::new(RecordingStore::accepting()),
        );

        let mut tenant = new_tenant();
        tenant.email = "not-an-email".to_string();

        let err = service.register(&tenant).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Invalid(_)));
    }
}
