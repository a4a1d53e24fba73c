use reqwest::{header, Method};
use serde::{de::DeserializeOwned, Serialize};

/// Immutable description of an outbound request, replayed on every attempt.
///
/// Retrying assumes the request is safe to repeat; nothing here checks it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a request with a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(
        method: Method,
        url: impl Into<String>,
        payload: &T,
    ) -> serde_json::Result<Self> {
        let body = serde_json::to_string(payload)?;
        Ok(Self::new(method, url)
            .header(header::CONTENT_TYPE.as_str(), "application/json")
            .body(body))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Successful (2xx) response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::{RequestSpec, Response};

    #[test]
    fn json_request_sets_content_type() {
        let spec = RequestSpec::json(Method::PUT, "http://svc/items/1", &json!({"qty": 2}))
            .expect("payload must serialize");
        assert_eq!(spec.method, Method::PUT);
        assert_eq!(spec.body.as_deref(), Some(r#"{"qty":2}"#));
        assert!(spec
            .headers
            .iter()
            .any(|(name, value)| name == "content-type" && value == "application/json"));
    }

    #[test]
    fn response_body_decodes_as_json() {
        let response = Response {
            status: 200,
            body: r#"{"ok":true}"#.to_owned(),
        };
        let value: serde_json::Value = response.json().expect("body must decode");
        assert_eq!(value["ok"], true);
    }
}
