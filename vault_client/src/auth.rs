use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest_middleware::RequestBuilder;

/// Attaches a credential to an outgoing request.
///
/// The credential is handed to the client explicitly and applied per request, so two clients
/// in one process never share authentication state.
#[async_trait]
pub trait CredentialHelper: Send + Sync {
    async fn fill_credential(&self, req: RequestBuilder) -> Result<RequestBuilder>;

    // Used in tests to identify the source of the credential.
    fn whoami(&self) -> &str;
}

/// Sends requests without any credential; used before login.
pub struct NoopCredentialHelper;

impl NoopCredentialHelper {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl CredentialHelper for NoopCredentialHelper {
    async fn fill_credential(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        Ok(req)
    }

    fn whoami(&self) -> &str {
        "noop"
    }
}

/// Attaches `Authorization: Bearer <token>`.
pub struct BearerCredentialHelper {
    token: String,
    whoami: String,
}

impl BearerCredentialHelper {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(token: String, whoami: &str) -> Arc<Self> {
        Arc::new(Self {
            token,
            whoami: whoami.to_owned(),
        })
    }
}

#[async_trait]
impl CredentialHelper for BearerCredentialHelper {
    async fn fill_credential(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        Ok(req.bearer_auth(&self.token))
    }

    fn whoami(&self) -> &str {
        &self.whoami
    }
}
