//! A client for the Facebook Graph API, scoped to one user access token.

use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";

const PROFILE_FIELDS: &str =
    "id,name,first_name,last_name,username,email,verified,link,website,about,bio,birthday,gender";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Graph API returned an error: {0}")]
    Api(String),

    #[error("Failed to parse Graph API response")]
    ResponseParse,

    #[error("Graph session is not authenticated")]
    NotAuthenticated,
}

/// A page the user likes, as returned by `/me/likes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLike {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub created_time: Option<String>,
}

/// A friend of the user, as returned by `/me/friends`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphFriend {
    pub id: String,
    pub name: Option<String>,
}

/// An authenticated session with the Graph API.
#[async_trait::async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait FacebookGraph: Send + Sync {
    /// Whether the access token is accepted by Facebook.
    async fn is_authenticated(&self) -> bool;

    /// The raw `/me` payload of the token owner.
    async fn me(&self) -> Result<Value, GraphError>;

    async fn likes(&self) -> Result<Vec<GraphLike>, GraphError>;

    async fn friends(&self) -> Result<Vec<GraphFriend>, GraphError>;
}

/// Opens Graph sessions from access tokens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait GraphFactory: Send + Sync {
    fn open(&self, access_token: &str) -> Arc<dyn FacebookGraph>;
}

pub struct GraphClient {
    http: Client,
    base_url: String,
    access_token: String,
    profile: OnceCell<Value>,
}

impl GraphClient {
    pub fn new(http: Client, base_url: &str, access_token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            profile: OnceCell::new(),
        }
    }

    async fn get_json(&self, path: &str, fields: Option<&str>) -> Result<Value, GraphError> {
        if self.access_token.is_empty() {
            return Err(GraphError::NotAuthenticated);
        }

        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(&[("access_token", self.access_token.as_str())]);
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|_| GraphError::ResponseParse)?;

        if let Some(message) = api_error_message(&body) {
            tracing::warn!(path, status = %status, "Graph API error: {}", message);
            return Err(GraphError::Api(message));
        }
        if !status.is_success() {
            return Err(GraphError::Api(status.to_string()));
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl FacebookGraph for GraphClient {
    async fn is_authenticated(&self) -> bool {
        match self.me().await {
            Ok(_) => true,
            Err(GraphError::NotAuthenticated) => false,
            Err(err) => {
                tracing::info!("Graph session rejected: {}", err);
                false
            },
        }
    }

    async fn me(&self) -> Result<Value, GraphError> {
        self.profile
            .get_or_try_init(|| self.get_json("me", Some(PROFILE_FIELDS)))
            .await
            .cloned()
    }

    async fn likes(&self) -> Result<Vec<GraphLike>, GraphError> {
        parse_collection(self.get_json("me/likes", None).await?)
    }

    async fn friends(&self) -> Result<Vec<GraphFriend>, GraphError> {
        parse_collection(self.get_json("me/friends", None).await?)
    }
}

pub struct GraphClientFactory {
    http: Client,
    base_url: String,
}

impl GraphClientFactory {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

impl GraphFactory for GraphClientFactory {
    fn open(&self, access_token: &str) -> Arc<dyn FacebookGraph> {
        Arc::new(GraphClient::new(self.http.clone(), &self.base_url, access_token))
    }
}

fn api_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown Graph API error");
    Some(message.to_string())
}

/// Extracts the `data` array of a Graph API collection response.
fn parse_collection<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, GraphError> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => serde_json::from_value(data).map_err(|_| GraphError::ResponseParse),
            None => Ok(Vec::new()),
        },
        _ => Err(GraphError::ResponseParse),
    }
}
