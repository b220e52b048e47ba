//! Session gate: shared secrets bind an interactive session to one business.

use reviewlens_core::config::AccessMode;
use reviewlens_core::{AppError, AppResult};
use std::collections::HashMap;
use uuid::Uuid;

/// Maps a shared secret to the business it unlocks.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, secret: &str) -> Option<String>;
}

/// Resolver over a fixed, configured secret map.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretResolver {
    secrets: HashMap<String, String>,
}

impl StaticSecretResolver {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl SecretResolver for StaticSecretResolver {
    fn resolve(&self, secret: &str) -> Option<String> {
        self.secrets.get(secret.trim()).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated { business_id: String },
}

/// One interactive session. The id only correlates log lines.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Anonymous,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// Business bound by the last successful login.
    pub fn business_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { business_id } => Some(business_id),
            SessionState::Anonymous => None,
        }
    }

    /// Bind the session to the business `secret` unlocks.
    ///
    /// An unrecognized secret leaves the current state untouched.
    pub fn login(&mut self, resolver: &dyn SecretResolver, secret: &str) -> AppResult<&str> {
        let business_id = resolver.resolve(secret).ok_or_else(|| {
            tracing::warn!(session = %self.id, "Login rejected");
            AppError::Authentication("Unrecognized secret".to_string())
        })?;

        tracing::info!(session = %self.id, "Logged in as business {}", business_id);
        self.state = SessionState::Authenticated { business_id };
        Ok(self.business_id().unwrap_or_default())
    }

    pub fn logout(&mut self) {
        if let Some(business_id) = self.business_id() {
            tracing::info!(session = %self.id, "Logged out of business {}", business_id);
        }
        self.state = SessionState::Anonymous;
    }

    /// Business scope for the next retrieval.
    ///
    /// Gated: always the bound business; anonymous sessions and requests for
    /// another business are refused. Open: the requested business, else the
    /// bound one, else no scope. Blank ids count as absent.
    pub fn retrieval_scope(&self, mode: AccessMode, requested: Option<&str>) -> AppResult<Option<String>> {
        let requested = requested.map(str::trim).filter(|id| !id.is_empty());

        match mode {
            AccessMode::Gated => {
                let bound = self.business_id().ok_or_else(|| {
                    AppError::Authentication("Log in before asking about reviews".to_string())
                })?;
                match requested {
                    Some(id) if id != bound => Err(AppError::Authentication(format!(
                        "Session is not authorized for business {}",
                        id
                    ))),
                    _ => Ok(Some(bound.to_string())),
                }
            }
            AccessMode::Open => Ok(requested.or(self.business_id()).map(str::to_string)),
        }
    }
}
