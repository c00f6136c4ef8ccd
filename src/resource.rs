//! Lifecycle of a managed API key: create, read, update, delete and the
//! `apply` reconciliation that picks between them.
//!
//! Every operation makes its remote calls one after another and stops at the
//! first failure. Nothing is retried. If the process dies between a
//! successful create and saving the returned state, the new key is orphaned
//! on the cluster.

use tracing::{info, warn};

use crate::body;
use crate::error::{Error, Result};
use crate::model::{ApiKeyResource, ApiKeyState};
use crate::services::security_api::SecurityApi;

/// What [`ApiKeyManager::apply`] decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    /// The name changed: a new key is created and the old one invalidated.
    Replace,
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub action: Action,
    pub state: ApiKeyState,
    /// Id of a replaced key whose invalidation failed and that is still live.
    pub orphaned: Option<String>,
}

/// Chooses the action that turns `prior` into `desired`.
pub fn plan(prior: Option<&ApiKeyState>, desired: &ApiKeyResource) -> Action {
    match prior {
        None => Action::Create,
        Some(prior) if prior.name != desired.name => Action::Replace,
        Some(prior) if !desired.same_role_descriptors(&prior.role_descriptors) => Action::Update,
        Some(_) => Action::Noop,
    }
}

pub struct ApiKeyManager<A> {
    api: A,
}

impl<A: SecurityApi> ApiKeyManager<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip_all, fields(name = %desired.name))]
    pub async fn create(&self, desired: &ApiKeyResource) -> Result<ApiKeyState> {
        desired.validate()?;
        let request = body::create_body(desired);

        let created = self.api.create_api_key(&request).await?;
        info!(id = %created.id, expiration = ?created.expiration, "Created API key");

        Ok(ApiKeyState {
            id: created.id,
            api_key: created.api_key,
            encoded: created.encoded,
            name: desired.name.clone(),
            role_descriptors: desired.role_descriptors.clone(),
        })
    }

    /// Returns the stored state as is. The cluster is not contacted; use
    /// [`ApiKeyManager::refresh`] to look for drift.
    pub fn read(&self, prior: &ApiKeyState) -> ApiKeyState {
        prior.clone()
    }

    /// Checks that the stored key still exists and is valid on the cluster.
    ///
    /// Returns `None` when the key is gone or invalidated, in which case the
    /// state should be dropped and the key created again.
    #[tracing::instrument(skip_all, fields(id = %prior.id))]
    pub async fn refresh(&self, prior: &ApiKeyState) -> Result<Option<ApiKeyState>> {
        match self.api.get_api_key(&prior.id).await? {
            None => {
                warn!("API key no longer exists on the cluster");
                Ok(None)
            }
            Some(info) if info.invalidated => {
                warn!("API key has been invalidated outside of this tool");
                Ok(None)
            }
            Some(info) => {
                if let Some(remote) = info.name.as_deref().filter(|n| *n != prior.name) {
                    warn!(remote, stored = %prior.name, "API key name differs on the cluster");
                }
                Ok(Some(prior.clone()))
            }
        }
    }

    /// Replaces the role descriptors of an existing key.
    ///
    /// The cluster cannot rename a key, so a changed name is rejected here;
    /// [`ApiKeyManager::apply`] handles renames by replacement.
    #[tracing::instrument(skip_all, fields(id = %prior.id))]
    pub async fn update(&self, prior: &ApiKeyState, desired: &ApiKeyResource) -> Result<ApiKeyState> {
        desired.validate()?;
        if prior.name != desired.name {
            return Err(Error::input(format!(
                "API key name cannot change from '{}' to '{}' in place",
                prior.name, desired.name
            )));
        }

        let request = body::build_body(desired);
        let updated = self.api.update_api_key(&prior.id, &request).await?;
        info!(updated = updated.updated, "Updated API key");

        Ok(ApiKeyState {
            role_descriptors: desired.role_descriptors.clone(),
            ..prior.clone()
        })
    }

    #[tracing::instrument(skip_all, fields(id = %prior.id))]
    pub async fn delete(&self, prior: &ApiKeyState) -> Result<()> {
        let result = self.api.invalidate_api_key(&prior.id).await?;

        if result.error_count > 0 {
            warn!(error_count = result.error_count, "Cluster reported errors invalidating API key");
        }
        info!(
            invalidated = result.invalidated_api_keys.len(),
            previously_invalidated = result.previously_invalidated_api_keys.len(),
            "Invalidated API key"
        );
        Ok(())
    }

    /// Brings the cluster in line with `desired`, starting from `prior`.
    pub async fn apply(&self, prior: Option<&ApiKeyState>, desired: &ApiKeyResource) -> Result<Applied> {
        let action = plan(prior, desired);
        info!(?action, name = %desired.name, "Planned");

        match (action, prior) {
            (Action::Update, Some(prior)) => Ok(Applied {
                action,
                state: self.update(prior, desired).await?,
                orphaned: None,
            }),
            (Action::Replace, Some(prior)) => {
                let state = self.create(desired).await?;
                let orphaned = match self.delete(prior).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(old_id = %prior.id, error = %e, "Replaced API key is still valid");
                        Some(prior.id.clone())
                    }
                };
                Ok(Applied {
                    action,
                    state,
                    orphaned,
                })
            }
            (Action::Noop, Some(prior)) => Ok(Applied {
                action,
                state: self.read(prior),
                orphaned: None,
            }),
            _ => Ok(Applied {
                action: Action::Create,
                state: self.create(desired).await?,
                orphaned: None,
            }),
        }
    }
}
