//! Role-based access checks.
//!
//! Members registered with required roles get an [`AuthMiddleware`] in front
//! of their middleware chain. The check itself is delegated to the
//! [`AuthChecker`] supplied when the schema is built.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{HandlerResult, Middleware, Next, ResolvedValue, ResolverData};

/// Role token required by a guarded field or handler.
pub type Role = String;

/// Decides whether a request may resolve a guarded member.
#[async_trait]
pub trait AuthChecker: Send + Sync {
    /// Returns `true` when access is granted. `roles` is empty when the
    /// member only requires an authenticated caller.
    async fn check(&self, data: &ResolverData, roles: &[Role]) -> bool;
}

/// What a denied access resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Deny with an access error.
    #[default]
    Error,
    /// Resolve the member to null.
    Null,
}

pub(crate) const UNAUTHORIZED_MESSAGE: &str =
    "Access denied! You need to be authorized to perform this action!";
pub(crate) const FORBIDDEN_MESSAGE: &str =
    "Access denied! You don't have permission for this action!";

/// Middleware running the auth checker before the rest of the chain.
pub(crate) struct AuthMiddleware {
    checker: Arc<dyn AuthChecker>,
    mode: AuthMode,
    roles: Vec<Role>,
}

impl AuthMiddleware {
    pub(crate) fn new(checker: Arc<dyn AuthChecker>, mode: AuthMode, roles: Vec<Role>) -> Self {
        Self {
            checker,
            mode,
            roles,
        }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn resolve(&self, data: &ResolverData, next: Next<'_>) -> HandlerResult {
        if self.checker.check(data, &self.roles).await {
            return next.run().await;
        }

        debug!(
            field = %data.info.field_name,
            parent = %data.info.parent_type,
            roles = ?self.roles,
            "Access denied"
        );
        match self.mode {
            AuthMode::Null => Ok(ResolvedValue::Null),
            AuthMode::Error if self.roles.is_empty() => {
                Err(async_graphql::Error::new(UNAUTHORIZED_MESSAGE))
            }
            AuthMode::Error => Err(async_graphql::Error::new(FORBIDDEN_MESSAGE)),
        }
    }

    fn name(&self) -> &str {
        "auth"
    }
}
