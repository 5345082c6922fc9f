//! Google Drive Activity v2 client.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use sharesweep_common::{Error, Result};

use super::auth::TokenManager;
use super::client::{bearer, build_http_client, handle_response};
use crate::model::{ActivityQueryResponse, ActivityRecord};
use crate::provider::{ActivityLog, ActivityQuery};

/// Drive Activity query endpoint.
const ACTIVITY_QUERY_URL: &str = "https://driveactivity.googleapis.com/v2/activity:query";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    page_size: u32,
    filter: &'a str,
}

/// Client for the account activity log.
pub struct ActivityClient {
    http: Client,
    token_manager: Arc<TokenManager>,
}

impl ActivityClient {
    pub fn new(token_manager: Arc<TokenManager>) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            token_manager,
        })
    }
}

#[async_trait]
impl ActivityLog for ActivityClient {
    async fn query_activity(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>> {
        let auth = bearer(&self.token_manager).await?;
        let body = QueryRequest {
            page_size: query.page_size,
            filter: &query.filter,
        };

        debug!("Querying activity: {}", query.filter);

        let response = self
            .http
            .post(ACTIVITY_QUERY_URL)
            .header(header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to query activity: {}", e)))?;

        let response: ActivityQueryResponse = handle_response(response).await?;
        Ok(response.activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_body() {
        let body = QueryRequest {
            page_size: 10,
            filter: "time > 1700000000000",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pageSize": 10, "filter": "time > 1700000000000"})
        );
    }
}
