//! Local stand-in for provider HTTP APIs, used by adapter tests.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::{json, Value};

/// A request the fake API received.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    /// Decoded `application/x-www-form-urlencoded` pairs.
    pub fn form(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(&self.body).unwrap()
    }

    pub fn form_value(&self, key: &str) -> Option<String> {
        self.form().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

struct Route {
    method: Method,
    path: String,
    status: StatusCode,
    body: Value,
}

struct FakeState {
    routes: Vec<Route>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Fake provider API bound to an ephemeral local port.
pub(crate) struct FakeApi {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeApi {
    /// Starts a server answering `(method, path)` with the given status and JSON.
    /// Unmatched requests get a 404.
    pub async fn start(routes: Vec<(Method, &str, u16, Value)>) -> Self {
        let state = Arc::new(FakeState {
            routes: routes
                .into_iter()
                .map(|(method, path, status, body)| Route {
                    method,
                    path: path.to_string(),
                    status: StatusCode::from_u16(status).unwrap(),
                    body,
                })
                .collect(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn only_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected one request, got {:?}", requests);
        requests.into_iter().next().unwrap()
    }
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    state
        .routes
        .iter()
        .find(|r| r.method == method && r.path == uri.path())
        .map(|r| (r.status, Json(r.body.clone())))
        .unwrap_or((StatusCode::NOT_FOUND, Json(json!({"error": "no route"}))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_decodes_brackets_and_spaces() {
        let request = RecordedRequest {
            method: Method::POST,
            path: "/v1/checkout/sessions".to_string(),
            headers: HeaderMap::new(),
            body: "line_items%5B0%5D%5Bprice%5D=price_1&metadata%5Bnote%5D=two+words".to_string(),
        };

        assert_eq!(
            request.form_value("line_items[0][price]").as_deref(),
            Some("price_1")
        );
        assert_eq!(
            request.form_value("metadata[note]").as_deref(),
            Some("two words")
        );
        assert!(request.form_value("missing").is_none());
    }
}
