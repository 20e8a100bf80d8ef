//! ArangoDB provider implementation.
//!
//! This module provides the concrete implementation of `GraphStore` on top of
//! the ArangoDB HTTP API using `reqwest`.

use async_trait::async_trait;
use gdelt_indexer_shared::{Collection, LocatedEvent};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::arangodb::collection_config::{collection_type_code, located_events_query};
use crate::config::ArangoConfig;
use crate::errors::GraphStoreError;
use crate::interfaces::GraphStore;

/// Rows fetched per cursor round trip.
const CURSOR_BATCH_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct CursorResponse {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(rename = "hasMore", default)]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// ArangoDB provider implementation.
///
/// # Example
///
/// ```ignore
/// use gdelt_indexer_repository::{ArangoConfig, ArangoProvider, GraphStore};
///
/// let provider = ArangoProvider::new(ArangoConfig::new("http://localhost:8529", "Gdelt_DB"))?;
/// provider.ensure_collections().await?;
/// let events = provider.located_events(Some(100)).await?;
/// ```
pub struct ArangoProvider {
    client: Client,
    base_url: String,
    config: ArangoConfig,
}

impl ArangoProvider {
    /// Create a new provider for the configured server.
    ///
    /// No request is made here; use `ping` to check connectivity.
    ///
    /// # Returns
    ///
    /// * `Ok(ArangoProvider)` - A new provider instance
    /// * `Err(GraphStoreError)` - If the URL is invalid or the HTTP client cannot be built
    pub fn new(config: ArangoConfig) -> Result<Self, GraphStoreError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| GraphStoreError::connection(e.to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GraphStoreError::connection(e.to_string()))?;

        info!(
            url = %parsed_url,
            database = %config.database,
            "Created ArangoDB provider"
        );

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            config,
        })
    }

    fn db_url(&self, path: &str) -> String {
        format!("{}/_db/{}/_api/{}", self.base_url, self.config.database, path)
    }

    fn system_url(&self, path: &str) -> String {
        format!("{}/_db/_system/_api/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, GraphStoreError> {
        builder
            .send()
            .await
            .map_err(|e| GraphStoreError::connection(e.to_string()))
    }

    async fn describe_failure(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }

    async fn ensure_database(&self) -> Result<(), GraphStoreError> {
        let response =
            Self::send(self.request(Method::GET, &self.db_url("database/current"))).await?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            let detail = Self::describe_failure(response).await;
            return Err(GraphStoreError::collection(format!(
                "Failed to inspect database {}: {}",
                self.config.database, detail
            )));
        }

        let response = Self::send(
            self.request(Method::POST, &self.system_url("database"))
                .json(&json!({ "name": self.config.database })),
        )
        .await?;

        match response.status() {
            status if status.is_success() => {
                info!(database = %self.config.database, "Created database");
                Ok(())
            }
            // Created concurrently by someone else
            StatusCode::CONFLICT => Ok(()),
            _ => {
                let detail = Self::describe_failure(response).await;
                error!(database = %self.config.database, detail = %detail, "Database creation failed");
                Err(GraphStoreError::collection(format!(
                    "Failed to create database {}: {}",
                    self.config.database, detail
                )))
            }
        }
    }

    async fn ensure_collection(&self, collection: Collection) -> Result<(), GraphStoreError> {
        let name = collection.name();
        let response = Self::send(
            self.request(Method::GET, &self.db_url(&format!("collection/{}", name))),
        )
        .await?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            let detail = Self::describe_failure(response).await;
            return Err(GraphStoreError::collection(format!(
                "Failed to inspect collection {}: {}",
                name, detail
            )));
        }

        let response = Self::send(
            self.request(Method::POST, &self.db_url("collection")).json(&json!({
                "name": name,
                "type": collection_type_code(collection.kind()),
            })),
        )
        .await?;

        match response.status() {
            status if status.is_success() => {
                info!(collection = %name, "Created collection");
                Ok(())
            }
            StatusCode::CONFLICT => Ok(()),
            _ => {
                let detail = Self::describe_failure(response).await;
                Err(GraphStoreError::collection(format!(
                    "Failed to create collection {}: {}",
                    name, detail
                )))
            }
        }
    }

    async fn parse_cursor(response: Response) -> Result<CursorResponse, GraphStoreError> {
        if !response.status().is_success() {
            let detail = Self::describe_failure(response).await;
            return Err(GraphStoreError::query(detail));
        }
        response
            .json::<CursorResponse>()
            .await
            .map_err(|e| GraphStoreError::parse(e.to_string()))
    }

    /// Run an AQL query and drain its cursor.
    async fn query(&self, query: &str, bind_vars: Value) -> Result<Vec<Value>, GraphStoreError> {
        let response = Self::send(self.request(Method::POST, &self.db_url("cursor")).json(&json!({
            "query": query,
            "bindVars": bind_vars,
            "batchSize": CURSOR_BATCH_SIZE,
        })))
        .await?;

        let mut page = Self::parse_cursor(response).await?;
        let mut rows = std::mem::take(&mut page.result);

        while page.has_more {
            let cursor_id = page
                .id
                .clone()
                .ok_or_else(|| GraphStoreError::parse("Cursor has more results but no id"))?;
            let response = Self::send(
                self.request(Method::PUT, &self.db_url(&format!("cursor/{}", cursor_id))),
            )
            .await?;
            page = Self::parse_cursor(response).await?;
            rows.append(&mut page.result);
        }

        debug!(rows = rows.len(), "Query completed");
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for ArangoProvider {
    async fn ping(&self) -> Result<(), GraphStoreError> {
        let response = Self::send(self.request(Method::GET, &self.system_url("version"))).await?;
        if !response.status().is_success() {
            let detail = Self::describe_failure(response).await;
            return Err(GraphStoreError::connection(detail));
        }
        debug!(url = %self.base_url, "ArangoDB reachable");
        Ok(())
    }

    async fn ensure_collections(&self) -> Result<(), GraphStoreError> {
        self.ensure_database().await?;
        for collection in Collection::ALL {
            self.ensure_collection(collection).await?;
        }
        Ok(())
    }

    async fn truncate(&self, collection: Collection) -> Result<(), GraphStoreError> {
        let response = Self::send(self.request(
            Method::PUT,
            &self.db_url(&format!("collection/{}/truncate", collection.name())),
        ))
        .await?;

        if !response.status().is_success() {
            let detail = Self::describe_failure(response).await;
            error!(collection = %collection, detail = %detail, "Truncate request failed");
            return Err(GraphStoreError::truncate(format!(
                "Failed to truncate {}: {}",
                collection, detail
            )));
        }

        debug!(collection = %collection, "Collection truncated");
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        document: &Value,
    ) -> Result<(), GraphStoreError> {
        let response = Self::send(
            self.request(
                Method::POST,
                &self.db_url(&format!("document/{}", collection.name())),
            )
            .json(document),
        )
        .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => {
                let key = document
                    .get("_key")
                    .and_then(Value::as_str)
                    .unwrap_or("<generated>");
                Err(GraphStoreError::conflict(collection.name(), key))
            }
            _ => {
                let detail = Self::describe_failure(response).await;
                Err(GraphStoreError::insert(format!(
                    "Failed to insert into {}: {}",
                    collection, detail
                )))
            }
        }
    }

    async fn count(&self, collection: Collection) -> Result<u64, GraphStoreError> {
        let response = Self::send(self.request(
            Method::GET,
            &self.db_url(&format!("collection/{}/count", collection.name())),
        ))
        .await?;

        if !response.status().is_success() {
            let detail = Self::describe_failure(response).await;
            return Err(GraphStoreError::collection(format!(
                "Failed to count {}: {}",
                collection, detail
            )));
        }

        let body = response
            .json::<CountResponse>()
            .await
            .map_err(|e| GraphStoreError::parse(e.to_string()))?;
        Ok(body.count)
    }

    async fn located_events(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LocatedEvent>, GraphStoreError> {
        let bind_vars = match limit {
            Some(limit) => json!({ "limit": limit }),
            None => json!({}),
        };
        let rows = self
            .query(&located_events_query(limit.is_some()), bind_vars)
            .await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value::<LocatedEvent>(row)
                    .map_err(|e| GraphStoreError::parse(e.to_string()))
            })
            .collect()
    }
}
