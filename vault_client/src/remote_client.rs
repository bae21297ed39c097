use std::sync::Arc;

use bytes::Bytes;
use error_printer::ErrorPrinter;
use progress_tracking::ProgressCallback;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response, Url};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use vault_config::VaultConfig;
use vault_types::{
    AuthResponse, Credentials, ErrorBody, FileRecord, HealthStatus, ListFilesResponse, LoginSession,
    VaultTypesError, parse_upload_response,
};

use crate::auth::CredentialHelper;
use crate::error::{Result, UploadError, VaultClientError};
use crate::http_client::{build_http_client, build_upload_http_client};
use crate::interface::{FileLibraryClient, UploadTransport};
use crate::progress_tracked_streams::{StreamProgressReporter, UploadProgressStream};

/// Client for the FileVault REST API.
///
/// Holds two connection pools: the API calls go through a retrying client, uploads through one
/// without retry since their bodies are streamed once.
pub struct RemoteClient {
    endpoint: String,
    client: ClientWithMiddleware,
    upload_client: ClientWithMiddleware,
    cred_helper: Arc<dyn CredentialHelper>,
    stream_block_size: usize,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.cred_helper.whoami())
            .finish_non_exhaustive()
    }
}

impl RemoteClient {
    pub fn new(endpoint: &str, cred_helper: Arc<dyn CredentialHelper>, config: &VaultConfig) -> Result<Self> {
        let client = Self {
            endpoint: endpoint.to_owned(),
            client: build_http_client(&config.client)?,
            upload_client: build_upload_http_client(&config.client)?,
            cred_helper,
            stream_block_size: config.upload.stream_block_size,
        };
        // Fail on an unusable endpoint now rather than on the first request.
        client.url(&[])?;
        Ok(client)
    }

    /// A client for `config.client.endpoint`.
    pub fn from_config(cred_helper: Arc<dyn CredentialHelper>, config: &VaultConfig) -> Result<Self> {
        Self::new(&config.client.endpoint, cred_helper, config)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| VaultClientError::ConfigurationError(format!("endpoint {:?} cannot be a base URL", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        self.cred_helper
            .fill_credential(req)
            .await
            .map_err(VaultClientError::CredentialError)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, api: &str) -> Result<T> {
        let response = req.send().await.warn_error(format!("{api} request failed"))?;
        let response = check_status(response, api).await?;
        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body).map_err(VaultTypesError::from)?;
        Ok(value)
    }
}

async fn error_message(response: Response) -> Option<String> {
    let body = response.bytes().await.ok()?;
    serde_json::from_slice::<ErrorBody>(&body)
        .ok()?
        .message
        .filter(|m| !m.trim().is_empty())
}

async fn check_status(response: Response, api: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_message(response)
        .await
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| "Request failed".to_owned());
    warn!(%status, api, "{message}");
    Err(VaultClientError::StatusError { status, message })
}

#[async_trait::async_trait]
impl UploadTransport for RemoteClient {
    async fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        data: Bytes,
        progress_callback: ProgressCallback,
    ) -> std::result::Result<FileRecord, UploadError> {
        let total = data.len() as u64;
        let url = self.url(&["upload"]).map_err(|e| UploadError::Setup(e.to_string()))?;

        let reporter = StreamProgressReporter::new(total).with_progress_callback(progress_callback);
        let stream = UploadProgressStream::wrap_bytes_as_stream(data, self.stream_block_size, reporter);
        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(name.to_owned())
            .mime_str(mime_type)
            .map_err(|e| UploadError::Setup(format!("invalid MIME type {mime_type:?}: {e}")))?;
        let form = Form::new().part("file", part);

        let req = self.upload_client.post(url).multipart(form);
        let req = self
            .cred_helper
            .fill_credential(req)
            .await
            .map_err(|e| UploadError::Setup(format!("could not attach credential: {e}")))?;

        debug!(name, total, "upload: POST {}/upload", self.endpoint);

        let response = req.send().await.map_err(|e| UploadError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let err = UploadError::rejected(status, error_message(response).await);
            warn!(name, %status, "upload rejected: {err}");
            return Err(err);
        }

        let body = response.bytes().await.map_err(|e| UploadError::Network(e.to_string()))?;
        let record = parse_upload_response(&body).warn_error(format!("malformed upload response for {name}"))?;

        info!(name, id = %record.id, size = record.size, "upload complete");
        Ok(record)
    }
}

#[async_trait::async_trait]
impl FileLibraryClient for RemoteClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginSession> {
        let req = self.client.post(self.url(&["login"])?).json(&Credentials {
            email: email.to_owned(),
            password: password.to_owned(),
        });
        let response: AuthResponse = self.send_json(req, "login").await?;
        let session = response.into_login_session(email)?;
        info!(user_id = %session.user_id, "logged in");
        Ok(session)
    }

    async fn register(&self, email: &str, password: &str) -> Result<String> {
        let req = self.client.post(self.url(&["register"])?).json(&Credentials {
            email: email.to_owned(),
            password: password.to_owned(),
        });
        let response: AuthResponse = self.send_json(req, "register").await?;
        let user_id = response
            .user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| VaultTypesError::MalformedAuthResponse("missing user_id".to_owned()))?;
        info!(%user_id, "registered");
        Ok(user_id)
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let req = self.authorized(self.client.get(self.url(&["files"])?)).await?;
        let response: ListFilesResponse = self.send_json(req, "files").await?;

        let listed = response.files.len();
        let records: Vec<FileRecord> = response
            .files
            .into_iter()
            .filter_map(|d| FileRecord::try_from(d).warn_error("skipping malformed file descriptor").ok())
            .collect();
        debug!(listed, kept = records.len(), "listed files");
        Ok(records)
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let req = self.authorized(self.client.delete(self.url(&["files", file_id])?)).await?;
        let response = req.send().await.warn_error("delete request failed")?;
        check_status(response, "delete").await?;
        info!(file_id, "deleted file");
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus> {
        let req = self.client.get(self.url(&["health"])?);
        self.send_json(req, "health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoopCredentialHelper;

    #[test]
    fn test_url_joins_segments() {
        let config = VaultConfig::default();
        let client = RemoteClient::new("http://localhost:5000/api/", NoopCredentialHelper::new(), &config).unwrap();
        assert_eq!(client.url(&["files", "a b"]).unwrap().as_str(), "http://localhost:5000/api/files/a%20b");

        let client = RemoteClient::new("http://localhost:5000/api", NoopCredentialHelper::new(), &config).unwrap();
        assert_eq!(client.url(&["upload"]).unwrap().as_str(), "http://localhost:5000/api/upload");
    }

    #[test]
    fn test_bad_endpoint_is_rejected() {
        let config = VaultConfig::default();
        assert!(matches!(
            RemoteClient::new("not a url", NoopCredentialHelper::new(), &config),
            Err(VaultClientError::ParseError(_))
        ));
        assert!(matches!(
            RemoteClient::new("mailto:someone@example.com", NoopCredentialHelper::new(), &config),
            Err(VaultClientError::ConfigurationError(_))
        ));
    }
}
