//! reqwest-backed [`CollectionApi`]

use async_trait::async_trait;
use log::debug;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use super::codec::{embedded_items, extract_message};
use super::{ApiError, CollectionApi};
use crate::domain::{CollectionKind, CollectionRef, ItemId};

pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Session token sent as `Authorization: Token <token>`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => req.header("authorization", format!("Token {}", token)),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = self
            .with_auth(req)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), &body))
    }

    async fn json(resp: Response) -> Result<Value, ApiError> {
        resp.json::<Value>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Build the error for a non-success response body
pub(crate) fn status_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| extract_message(&value))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("request failed with status {}", status));
    ApiError::Status { status, message }
}

#[async_trait(?Send)]
impl CollectionApi for RestClient {
    async fn fetch(&self, collection: &CollectionRef) -> Result<Vec<Value>, ApiError> {
        // Images have their own listing; the other kinds come embedded in the parent
        if collection.kind == CollectionKind::Image {
            let url = self.url(&collection.collection_path());
            debug!("GET {}", url);
            let body = Self::json(self.send(self.client.get(url)).await?).await?;
            return match body {
                Value::Array(items) => Ok(items),
                other => Ok(embedded_items(collection.kind, &other)),
            };
        }
        let url = self.url(&collection.parent.entity_path());
        debug!("GET {}", url);
        let parent = Self::json(self.send(self.client.get(url)).await?).await?;
        Ok(embedded_items(collection.kind, &parent))
    }

    async fn create(&self, collection: &CollectionRef, body: Value) -> Result<Value, ApiError> {
        let url = self.url(&collection.collection_path());
        debug!("POST {}", url);
        Self::json(self.send(self.client.post(url).json(&body)).await?).await
    }

    async fn update(&self, collection: &CollectionRef, id: &ItemId, body: Value) -> Result<(), ApiError> {
        let url = self.url(&collection.item_path(id.as_str()));
        debug!("PUT {}", url);
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn delete(&self, collection: &CollectionRef, id: &ItemId) -> Result<(), ApiError> {
        let url = self.url(&collection.item_path(id.as_str()));
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParentKind, ParentRef};

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = RestClient::new("https://api.example.org/v1/");
        let faqs = CollectionRef::new(ParentRef::new(ParentKind::Group, "g1"), CollectionKind::Faq);
        assert_eq!(
            client.url(&faqs.item_path("f1")),
            format!("https://api.example.org/v1/{}", faqs.item_path("f1").trim_start_matches('/'))
        );
        assert!(!client.url("/x").contains("v1//"));
    }

    #[test]
    fn test_status_error_message_sources() {
        assert_eq!(
            status_error(401, r#"{"error":"User not authorized."}"#),
            ApiError::Status { status: 401, message: "User not authorized.".into() }
        );
        assert_eq!(
            status_error(502, "Bad Gateway"),
            ApiError::Status { status: 502, message: "Bad Gateway".into() }
        );
        assert_eq!(
            status_error(500, ""),
            ApiError::Status { status: 500, message: "request failed with status 500".into() }
        );
    }
}
