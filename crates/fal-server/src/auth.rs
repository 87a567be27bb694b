use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use fal_ledger::Actor;
use fal_types::{ActorId, Role};

use crate::config::TokenGrant;
use crate::error::{ServerError, ServerResult};

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub actor_id: ActorId,
    pub name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(actor_id: impl Into<ActorId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            name: name.into(),
            role,
        }
    }

    /// The caller as seen by the ledger.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.actor_id.clone(),
            name: self.name.clone(),
        }
    }

    /// Fail with `Forbidden` unless this identity's role satisfies `required`.
    pub fn require(&self, required: Role) -> ServerResult<()> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(ServerError::Forbidden { required })
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Extract credentials from an `Authorization: Bearer <token>` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self::Bearer(token.to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Resolves credentials to identities. Account storage and token issuance
/// live behind this trait.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Maps configured static bearer tokens to identities.
pub struct StaticTokenAuth {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenAuth {
    pub fn new(grants: &[TokenGrant]) -> Self {
        let tokens = grants
            .iter()
            .map(|g| {
                (
                    g.token.clone(),
                    Identity::new(g.actor_id.as_str(), g.name.clone(), g.role),
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) => self
                .tokens
                .get(token)
                .cloned()
                .ok_or_else(|| ServerError::AuthFailed("invalid or expired token".into())),
            Credentials::Anonymous => {
                Err(ServerError::AuthFailed("access token required".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn grants() -> Vec<TokenGrant> {
        vec![TokenGrant {
            token: "tok-mgr".into(),
            actor_id: "u-7".into(),
            name: "Morgan".into(),
            role: Role::Manager,
        }]
    }

    #[test]
    fn bearer_header_is_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(Credentials::from_headers(&headers), Credentials::Anonymous);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(Credentials::from_headers(&headers), Credentials::Bearer("abc".into()));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(Credentials::from_headers(&headers), Credentials::Anonymous);
    }

    #[test]
    fn role_requirements_follow_the_order() {
        let manager = Identity::new("u-7", "Morgan", Role::Manager);
        assert!(manager.require(Role::Viewer).is_ok());
        assert!(manager.require(Role::Auditor).is_ok());
        assert!(manager.require(Role::Manager).is_ok());
        assert!(matches!(
            manager.require(Role::Admin),
            Err(ServerError::Forbidden { required: Role::Admin })
        ));
        assert_eq!(manager.actor().name, "Morgan");
    }

    #[tokio::test]
    async fn static_tokens_resolve() {
        let auth = StaticTokenAuth::new(&grants());
        assert_eq!(auth.len(), 1);
        let id = auth
            .authenticate(&Credentials::Bearer("tok-mgr".into()))
            .await
            .unwrap();
        assert_eq!(id.actor_id, ActorId::new("u-7"));
        assert_eq!(id.role, Role::Manager);
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_rejected() {
        let auth = StaticTokenAuth::new(&grants());
        assert!(matches!(
            auth.authenticate(&Credentials::Bearer("nope".into())).await,
            Err(ServerError::AuthFailed(_))
        ));
        assert!(matches!(
            auth.authenticate(&Credentials::Anonymous).await,
            Err(ServerError::AuthFailed(_))
        ));
    }
}
