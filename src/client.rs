//! Typed HTTP client for the gateway. Unwraps `data` from success bodies and turns `{ error }`
//! bodies into `ClientError::Api`.

use crate::routing::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PAGE_PARAM, PAGE_SIZE_PARAM};
use crate::store::Row;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

/// One page of a list call. The gateway reports no total, so a short page marks the end.
#[derive(Clone, Debug)]
pub struct ListPage<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub page_size: u32,
}

impl<T> ListPage<T> {
    pub fn is_last(&self) -> bool {
        self.rows.len() < self.page_size as usize
    }
}

#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GatewayClient {
    /// `base_url` is the gateway root including any `/api` prefix, e.g. `http://host/functions/v1/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        GatewayClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Bearer token sent on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, entity: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.base_url, entity, id),
            None => format!("{}/{}", self.base_url, entity),
        }
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut req = self.http.request(method, url).query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&bytes)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
            return Err(ClientError::Api { status, message });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn data<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
        let env: Envelope<T> = serde_json::from_value(body)?;
        Ok(env.data)
    }

    /// GET /{entity}?page=&pageSize=&{filters}
    pub async fn list<T: DeserializeOwned>(
        &self,
        entity: &str,
        page: Option<u32>,
        page_size: Option<u32>,
        filters: &[(&str, &str)],
    ) -> Result<ListPage<T>, ClientError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let mut query = vec![
            (PAGE_PARAM.to_string(), page.to_string()),
            (PAGE_SIZE_PARAM.to_string(), page_size.to_string()),
        ];
        query.extend(filters.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let body = self.send(Method::GET, self.url(entity, None), &query, None).await?;
        Ok(ListPage {
            rows: Self::data(body)?,
            page,
            page_size,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, entity: &str, id: &str) -> Result<T, ClientError> {
        let body = self.send(Method::GET, self.url(entity, Some(id)), &[], None).await?;
        Self::data(body)
    }

    /// Returns the inserted rows.
    pub async fn create(&self, entity: &str, row: &Value) -> Result<Vec<Row>, ClientError> {
        let body = self.send(Method::POST, self.url(entity, None), &[], Some(row)).await?;
        Self::data(body)
    }

    /// Returns the updated rows (empty when nothing matched).
    pub async fn update(&self, entity: &str, id: &str, changes: &Value) -> Result<Vec<Row>, ClientError> {
        let body = self
            .send(Method::PUT, self.url(entity, Some(id)), &[], Some(changes))
            .await?;
        Self::data(body)
    }

    pub async fn delete(&self, entity: &str, id: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, self.url(entity, Some(id)), &[], None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls() {
        let c = GatewayClient::new("http://localhost:3000/api/");
        assert_eq!(c.url("alerts", None), "http://localhost:3000/api/alerts");
        assert_eq!(c.url("alerts", Some("9")), "http://localhost:3000/api/alerts/9");
    }

    #[test]
    fn short_page_is_last() {
        let page = ListPage::<Row> {
            rows: vec![Row::new(); 3],
            page: 1,
            page_size: 10,
        };
        assert!(page.is_last());
        let full = ListPage::<Row> {
            rows: vec![Row::new(); 10],
            page: 1,
            page_size: 10,
        };
        assert!(!full.is_last());
    }
}
