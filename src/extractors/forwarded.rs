//! Extract the caller headers that are forwarded to the row store (bearer token, api key, client info).

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::{Map, Value};

/// Request headers handed through to the store so row-level policies can see the caller.
pub const FORWARDED_HEADERS: &[&str] = &["authorization", "apikey", "x-client-info"];

/// Forwarded header values, lowercased names in `FORWARDED_HEADERS` order. Absent or
/// non-UTF-8 headers are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForwardedHeaders(pub Vec<(String, String)>);

impl ForwardedHeaders {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Token from `Authorization: Bearer <token>`.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.get("authorization")?;
        let (scheme, token) = value.split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") {
            Some(token.trim()).filter(|t| !t.is_empty())
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object of the forwarded headers, as published to the store session.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ForwardedHeaders
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let values = FORWARDED_HEADERS
            .iter()
            .filter_map(|name| {
                parts
                    .headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .map(|s| (name.to_string(), s))
            })
            .collect();
        Ok(ForwardedHeaders(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> ForwardedHeaders {
        let (mut parts, _) = req.into_parts();
        ForwardedHeaders::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn picks_forwarded_headers_only() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc.def")
            .header("x-client-info", "web/1.0")
            .header("content-type", "application/json")
            .body(())
            .unwrap();
        let fwd = extract(req).await;
        assert_eq!(fwd.bearer_token(), Some("abc.def"));
        assert_eq!(fwd.get("x-client-info"), Some("web/1.0"));
        assert_eq!(fwd.get("content-type"), None);
        assert_eq!(
            fwd.to_json(),
            serde_json::json!({ "authorization": "Bearer abc.def", "x-client-info": "web/1.0" })
        );
    }

    #[tokio::test]
    async fn non_bearer_authorization_has_no_token() {
        let req = Request::builder()
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        let fwd = extract(req).await;
        assert_eq!(fwd.bearer_token(), None);
        assert!(!fwd.is_empty());
    }

    #[tokio::test]
    async fn empty_bearer_is_ignored() {
        let req = Request::builder().header("authorization", "Bearer ").body(()).unwrap();
        assert_eq!(extract(req).await.bearer_token(), None);
    }
}
