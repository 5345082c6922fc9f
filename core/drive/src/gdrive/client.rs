//! Google Drive v3 files/permissions client.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;

use sharesweep_common::{Error, FileId, Result};

use super::auth::TokenManager;
use crate::model::{DriveFile, Permission, PermissionListResponse};
use crate::provider::FilePermissions;

/// Google Drive API base URL.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Permission fields the audit reads.
const PERMISSION_FIELDS: &str = "permissions(id,type,role,domain,emailAddress),nextPageToken";

/// Client user agent.
pub(crate) const USER_AGENT: &str = concat!("sharesweep/", env!("CARGO_PKG_VERSION"));

/// Google Drive API client.
pub struct DriveClient {
    http: Client,
    token_manager: Arc<TokenManager>,
}

impl DriveClient {
    /// Create a new Drive client.
    pub fn new(token_manager: Arc<TokenManager>) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            token_manager,
        })
    }

    async fn auth_header(&self) -> Result<String> {
        bearer(&self.token_manager).await
    }
}

#[async_trait]
impl FilePermissions for DriveClient {
    async fn list_permissions(&self, file_id: &FileId) -> Result<Vec<Permission>> {
        let url = format!("{}/files/{}/permissions", DRIVE_API_BASE, file_id);
        let mut all_permissions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let auth = self.auth_header().await?;

            let mut request = self
                .http
                .get(&url)
                .header(header::AUTHORIZATION, auth)
                .query(&[("fields", PERMISSION_FIELDS)]);

            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Network(format!("Failed to list permissions: {}", e)))?;

            let list_response: PermissionListResponse = handle_response(response).await?;
            all_permissions.extend(list_response.permissions);

            match list_response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_permissions)
    }

    async fn get_file(&self, file_id: &FileId) -> Result<DriveFile> {
        let url = format!("{}/files/{}", DRIVE_API_BASE, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", "id,name")])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to get file: {}", e)))?;

        handle_response(response).await
    }

    async fn delete_permission(&self, file_id: &FileId, permission_id: &str) -> Result<()> {
        let url = format!(
            "{}/files/{}/permissions/{}",
            DRIVE_API_BASE, file_id, permission_id
        );
        let auth = self.auth_header().await?;

        let response = self
            .http
            .delete(&url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to delete permission: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, response).await)
        }
    }
}

pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Authorization header value for the current access token.
pub(crate) async fn bearer(token_manager: &TokenManager) -> Result<String> {
    let token = token_manager.get_access_token().await?;
    Ok(format!("Bearer {}", token.expose()))
}

/// Handle API response with error checking.
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse response: {}", e)))
    } else {
        Err(status_error(status, response).await)
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> Error {
    let body = response.text().await.unwrap_or_default();
    error_for_status(status, body)
}

fn error_for_status(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(format!("Resource not found: {}", body)),
        StatusCode::UNAUTHORIZED => Error::Authentication("Invalid or expired token".to_string()),
        StatusCode::FORBIDDEN => Error::PermissionDenied(format!("Access denied: {}", body)),
        _ => Error::Network(format!("API error: {} - {}", status, body)),
    }
}
