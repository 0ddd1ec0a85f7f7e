//! Reproducible descriptions of failed platform requests.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::platform::SpotRequest;

/// An HTTP request rendered so an operator can replay it by hand.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiagnosticRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl DiagnosticRequest {
    /// Describe the spot attachment call for `block_id`.
    pub fn attach_spot(
        base_url: &str,
        token: Option<&str>,
        block_id: u64,
        request: &SpotRequest,
    ) -> Self {
        let authorization = match token {
            Some(token) => format!("Bearer {}", token),
            None => "Bearer <no session>".to_string(),
        };

        Self {
            method: "POST".to_string(),
            url: format!(
                "{}/blocks/{}/spots",
                base_url.trim_end_matches('/'),
                block_id
            ),
            headers: vec![
                ("Authorization".to_string(), authorization),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: serde_json::to_value(request).unwrap_or(Value::Null),
        }
    }

    /// Render as a curl command line.
    pub fn to_curl(&self) -> String {
        let mut parts = vec![format!("curl -X {} '{}'", self.method, self.url)];
        for (name, value) in &self.headers {
            parts.push(format!("-H '{}: {}'", name, value));
        }
        if !self.body.is_null() {
            parts.push(format!("-d '{}'", self.body));
        }
        parts.join(" ")
    }
}

impl fmt::Display for DiagnosticRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_curl())
    }
}
