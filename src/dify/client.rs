//! Thin HTTP client for the Dify API.
//!
//! - `upload_file` posts a multipart file to `/files/upload` and returns its handle.
//! - `run_workflow` posts a JSON payload to `/workflows/run` in blocking mode.
//! - `get_parameters` and `send_chat_message` are connectivity diagnostics.
//!
//! Every call checks the credential first and fails with
//! `AppError::Configuration` before touching the network.
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::image::codec::ImageResource;

/// Keys the upload response has used for the file identifier, in priority order.
pub const UPLOAD_ID_KEYS: &[&str] = &["id", "file_id", "upload_file_id"];

/// Opaque identifier of a file stored by the remote service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandle(pub String);

impl FileHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct DifyClient {
    client: Client,
    base_url: String,
    api_key: String,
    user_tag: String,
}

impl DifyClient {
    pub fn new(base_url: String, api_key: String, user_tag: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        DifyClient { client: Client::new(), base_url: base, api_key, user_tag }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dify_api_url.clone(), config.dify_api_key.clone(), config.user_tag.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_tag(&self) -> &str {
        &self.user_tag
    }

    /// Fails fast when no credential is configured.
    pub fn ensure_configured(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration);
        }
        Ok(())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }

    /// Upload one image and return the handle the service assigned to it.
    ///
    /// Holds no state between calls, so several uploads may run concurrently.
    pub async fn upload_file(&self, resource: &ImageResource) -> AppResult<FileHandle> {
        self.ensure_configured()?;
        let url = format!("{}/files/upload", self.base_url);
        tracing::info!(
            "Uploading '{}' ({} bytes) to Dify at URL: {}",
            resource.name,
            resource.bytes.len(),
            url
        );

        let part = Part::bytes(resource.bytes.clone())
            .file_name(resource.name.clone())
            .mime_str(&resource.mime)
            .map_err(|e| AppError::unexpected("Invalid image content type", e))?;
        let form = Form::new()
            .part("file", part)
            .text("user", self.user_tag.clone());

        let response = self.authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::unexpected("Failed to send upload request", e))?;

        if !response.status().is_success() {
            let (status, body) = read_failure(response).await;
            tracing::error!("Failed to upload file. Status: {}, Body: {}", status, body);
            return Err(AppError::Upload { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AppError::unexpected("Failed to parse upload response", e))?;
        let handle = extract_file_id(&json).ok_or_else(|| {
            AppError::Unexpected(format!("Upload response carried no file identifier: {}", json))
        })?;
        tracing::info!("Uploaded '{}' as {}", resource.name, handle.as_str());
        Ok(handle)
    }

    /// Run the configured workflow synchronously and return its raw JSON result.
    pub async fn run_workflow(&self, payload: &Value) -> AppResult<Value> {
        self.ensure_configured()?;
        let url = format!("{}/workflows/run", self.base_url);
        tracing::info!("Running Dify workflow at URL: {}", url);
        tracing::debug!("Workflow payload: {}", payload);

        let response = self.authorized(self.client.post(&url))
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::unexpected("Failed to send workflow request", e))?;
        json_or_workflow_error(response, "run workflow").await
    }

    /// Fetch the application's input parameters (`GET /parameters`).
    pub async fn get_parameters(&self) -> AppResult<Value> {
        self.ensure_configured()?;
        let url = format!("{}/parameters", self.base_url);
        tracing::info!("Fetching Dify parameters from URL: {}", url);
        let response = self.authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| AppError::unexpected("Failed to send parameters request", e))?;
        json_or_workflow_error(response, "fetch parameters").await
    }

    /// Send a single blocking chat message (`POST /chat-messages`).
    pub async fn send_chat_message(&self, query: &str) -> AppResult<Value> {
        self.ensure_configured()?;
        let url = format!("{}/chat-messages", self.base_url);
        tracing::info!("Sending chat message to URL: {}", url);
        let body = json!({
            "inputs": {},
            "query": query,
            "response_mode": "blocking",
            "user": self.user_tag,
        });
        let response = self.authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::unexpected("Failed to send chat message", e))?;
        json_or_workflow_error(response, "send chat message").await
    }
}

/// First candidate key present in the upload response wins.
pub fn extract_file_id(response: &Value) -> Option<FileHandle> {
    UPLOAD_ID_KEYS.iter().find_map(|key| match response.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(FileHandle(s.clone())),
        Value::Number(n) => Some(FileHandle(n.to_string())),
        _ => None,
    })
}

async fn read_failure(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
    (status, body)
}

async fn json_or_workflow_error(response: Response, action: &str) -> AppResult<Value> {
    if response.status().is_success() {
        let json = response.json().await.map_err(|e| {
            AppError::unexpected(&format!("Failed to parse response to {}", action), e)
        })?;
        tracing::debug!("Dify response: {}", json);
        Ok(json)
    } else {
        let (status, body) = read_failure(response).await;
        tracing::error!("Failed to {}. Status: {}, Body: {}", action, status, body);
        Err(AppError::Workflow { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &mockito::ServerGuard, key: &str) -> DifyClient {
        DifyClient::new(server.url(), key.to_string(), "test-user".to_string())
    }

    fn sample_image() -> ImageResource {
        ImageResource::from_bytes("left.png", b"fake-image-bytes".to_vec())
    }

    #[test]
    fn file_id_probes_keys_in_order() {
        assert_eq!(
            extract_file_id(&json!({"id": "a", "file_id": "b"})),
            Some(FileHandle("a".into()))
        );
        assert_eq!(
            extract_file_id(&json!({"upload_file_id": "c", "file_id": "b"})),
            Some(FileHandle("b".into()))
        );
        assert_eq!(extract_file_id(&json!({"upload_file_id": 42})), Some(FileHandle("42".into())));
        assert_eq!(
            extract_file_id(&json!({"id": "", "file_id": "b"})),
            Some(FileHandle("b".into()))
        );
        assert_eq!(extract_file_id(&json!({"name": "x"})), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = DifyClient::new("http://localhost/v1/".into(), "k".into(), "u".into());
        assert_eq!(client.base_url(), "http://localhost/v1");
    }

    #[tokio::test]
    async fn upload_sends_multipart_with_user_tag() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/files/upload")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="left.png""#.into()),
                Matcher::Regex(r#"name="user""#.into()),
                Matcher::Regex("test-user".into()),
            ]))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "file-123", "name": "left.png"}"#)
            .create_async()
            .await;

        let handle = client_for(&server, "test-key").upload_file(&sample_image()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(handle, FileHandle("file-123".into()));
    }

    #[tokio::test]
    async fn upload_failure_carries_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/files/upload")
            .with_status(413)
            .with_body("file too large")
            .create_async()
            .await;

        let err = client_for(&server, "test-key").upload_file(&sample_image()).await.unwrap_err();
        match err {
            AppError::Upload { status, body } => {
                assert_eq!(status, 413);
                assert_eq!(body, "file too large");
            }
            other => panic!("expected upload error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_without_identifier_is_unexpected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/files/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "left.png"}"#)
            .create_async()
            .await;

        let err = client_for(&server, "test-key").upload_file(&sample_image()).await.unwrap_err();
        assert!(matches!(err, AppError::Unexpected(_)));
    }

    #[tokio::test]
    async fn missing_key_never_touches_network() {
        let mut server = Server::new_async().await;
        let upload = server.mock("POST", "/files/upload").expect(0).create_async().await;
        let run = server.mock("POST", "/workflows/run").expect(0).create_async().await;
        let params = server.mock("GET", "/parameters").expect(0).create_async().await;
        let chat = server.mock("POST", "/chat-messages").expect(0).create_async().await;

        let client = client_for(&server, "");
        assert!(matches!(client.upload_file(&sample_image()).await, Err(AppError::Configuration)));
        assert!(matches!(client.run_workflow(&json!({})).await, Err(AppError::Configuration)));
        assert!(matches!(client.get_parameters().await, Err(AppError::Configuration)));
        assert!(matches!(client.send_chat_message("hi").await, Err(AppError::Configuration)));

        upload.assert_async().await;
        run.assert_async().await;
        params.assert_async().await;
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn workflow_failure_carries_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/workflows/run")
            .with_status(400)
            .with_body(r#"{"code": "invalid_param"}"#)
            .create_async()
            .await;

        let err = client_for(&server, "test-key")
            .run_workflow(&json!({"inputs": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert!(matches!(err, AppError::Workflow { .. }));
    }

    #[tokio::test]
    async fn unparseable_workflow_body_is_unexpected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/workflows/run")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = client_for(&server, "test-key").run_workflow(&json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Unexpected(_)));
    }

    #[tokio::test]
    async fn chat_message_uses_blocking_mode() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat-messages")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "query": "Hello",
                "response_mode": "blocking",
                "user": "test-user"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer": "Hi"}"#)
            .create_async()
            .await;

        let reply = client_for(&server, "test-key").send_chat_message("Hello").await.unwrap();
        mock.assert_async().await;
        assert_eq!(reply["answer"], "Hi");
    }
}
