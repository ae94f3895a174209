use crate::config::BackendConfig;

/// Session credential and operator identity, injected rather than looked up globally.
pub trait CredentialProvider: Send + Sync {
    /// Bearer token for backend calls; `None` sends no Authorization header.
    fn credential(&self) -> Option<String>;
    /// Operator recorded as `createdBy`; 0 when unknown.
    fn operator_id(&self) -> i64;
}

/// Fixed credentials, typically resolved once from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCredentials {
    token: Option<String>,
    operator_id: i64,
}

impl StaticCredentials {
    pub fn new(token: Option<String>, operator_id: i64) -> Self {
        Self { token, operator_id }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.api_token.clone(), config.operator_id)
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self) -> Option<String> {
        self.token.clone()
    }

    fn operator_id(&self) -> i64 {
        self.operator_id
    }
}
