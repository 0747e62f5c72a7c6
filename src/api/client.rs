//! HTTP API Client
//!
//! The single request-issuing object shared by every caller. Each call runs
//! through the request interceptors, the transport, and the response
//! interceptors, in that order.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiResult;
use super::middleware::Pipeline;
use super::request::{IncomingResponse, OutgoingRequest};
use super::transport::Transport;
use crate::stores::Stores;

/// Authenticated client for the admin backend
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    pipeline: Pipeline,
}

impl ApiClient {
    /// Client with the standard pipeline reading from `stores`
    pub fn new(stores: &Stores, transport: Arc<dyn Transport>) -> Self {
        let pipeline = Pipeline::standard(Arc::clone(&stores.auth), Arc::clone(&stores.settings));
        Self::with_pipeline(pipeline, transport)
    }

    /// Client with a caller-supplied pipeline
    pub fn with_pipeline(pipeline: Pipeline, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Issue a call.
    ///
    /// Non-2xx responses come back as `ApiError::Status`.
    pub async fn send(&self, request: OutgoingRequest) -> ApiResult<IncomingResponse> {
        let request = self.pipeline.apply_request(request);

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            base = request.base_url.as_deref().unwrap_or(""),
            "Sending request"
        );

        let outcome = match self.transport.send(request).await {
            Ok(response) => {
                tracing::debug!(status = response.status, "Received response");
                response.into_result()
            }
            Err(e) => {
                tracing::debug!("Request failed: {}", e);
                Err(e)
            }
        };

        self.pipeline.apply_response(outcome)
    }

    pub async fn get(&self, path: &str) -> ApiResult<IncomingResponse> {
        self.send(OutgoingRequest::get(path)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<IncomingResponse> {
        self.send(OutgoingRequest::delete(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<IncomingResponse> {
        self.send(OutgoingRequest::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<IncomingResponse> {
        self.send(OutgoingRequest::put(path).json(body)?).await
    }

    /// GET and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get(path).await?.json()
    }

    /// POST a JSON body and decode a JSON reply
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body).await?.json()
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::{KeyValueStorage, MemoryStorage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records requests and replays canned outcomes
    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<OutgoingRequest>>,
        replies: Mutex<VecDeque<ApiResult<IncomingResponse>>>,
    }

    impl MockTransport {
        fn replying(replies: Vec<ApiResult<IncomingResponse>>) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            })
        }

        fn sent(&self) -> Vec<OutgoingRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: OutgoingRequest) -> ApiResult<IncomingResponse> {
            self.sent.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(IncomingResponse::new(200, "{}")))
        }
    }

    fn setup(token: Option<&str>) -> (Stores, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let stores = Stores::load(storage.clone()).unwrap();
        stores.settings.set_server("10.0.0.5", 8080).unwrap();
        if let Some(token) = token {
            stores.auth.set_token(token).unwrap();
        }
        (stores, storage)
    }

    #[tokio::test]
    async fn test_request_is_shaped_before_transport() {
        let (stores, _) = setup(Some("abc123"));
        let transport = MockTransport::replying(vec![]);
        let client = ApiClient::new(&stores, transport.clone());

        client.get("/file").await.unwrap();
        client.post("/task", &serde_json::json!({"cmd": "ls"})).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        for req in &sent {
            assert_eq!(req.base_url.as_deref(), Some("http://10.0.0.5:8080"));
            assert_eq!(req.header_value("Authorization"), Some("Bearer abc123"));
        }
        assert_eq!(sent[0].url().unwrap(), "http://10.0.0.5:8080/file");
        assert_eq!(sent[1].body.as_ref().unwrap()["cmd"], "ls");
    }

    #[tokio::test]
    async fn test_no_authorization_without_token() {
        let (stores, _) = setup(None);
        let transport = MockTransport::replying(vec![]);
        let client = ApiClient::new(&stores, transport.clone());

        client.get("/file").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].header_value("Authorization"), None);
        assert!(sent[0].headers.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_logs_out_and_propagates() {
        let (stores, storage) = setup(Some("abc123"));
        let transport =
            MockTransport::replying(vec![Ok(IncomingResponse::new(401, "token expired"))]);
        let client = ApiClient::new(&stores, transport.clone());

        let err = client.get("/task").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "API error 401: token expired");
        assert_eq!(stores.auth.token(), None);
        assert_eq!(storage.get_item("token").unwrap(), None);

        // The next call goes out without a credential
        client.get("/task").await.unwrap();
        assert_eq!(transport.sent()[1].header_value("Authorization"), None);
    }

    #[tokio::test]
    async fn test_server_error_keeps_credential() {
        let (stores, storage) = setup(Some("abc123"));
        let transport = MockTransport::replying(vec![Ok(IncomingResponse::new(500, "boom"))]);
        let client = ApiClient::new(&stores, transport);

        let err = client.get("/task").await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(stores.auth.token().as_deref(), Some("abc123"));
        assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_transport_error_keeps_credential() {
        let (stores, _) = setup(Some("abc123"));
        let transport = MockTransport::replying(vec![Err(ApiError::InvalidRequest(
            "unreachable".to_string(),
        ))]);
        let client = ApiClient::new(&stores, transport);

        let err = client.get("/task").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(stores.auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Task {
            id: u32,
            status: String,
        }

        let (stores, _) = setup(Some("abc123"));
        let transport = MockTransport::replying(vec![
            Ok(IncomingResponse::new(200, r#"{"id": 3, "status": "done"}"#)),
            Ok(IncomingResponse::new(201, r#"{"id": 4, "status": "queued"}"#)),
        ]);
        let client = ApiClient::new(&stores, transport);

        let task: Task = client.get_json("/task/3").await.unwrap();
        assert_eq!(task.status, "done");

        let task: Task = client
            .post_json("/task", &serde_json::json!({"cmd": "uptime"}))
            .await
            .unwrap();
        assert_eq!(task, Task { id: 4, status: "queued".to_string() });
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let (stores, _) = setup(Some("abc123"));
        let transport = MockTransport::replying(vec![
            Ok(IncomingResponse::new(200, "a")),
            Ok(IncomingResponse::new(200, "b")),
        ]);
        let client = ApiClient::new(&stores, transport.clone());

        let (a, b) = tokio::join!(client.get("/file"), client.get("/shell"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_pipeline() {
        let transport = MockTransport::replying(vec![]);
        let pipeline = Pipeline::new().with_request(|mut req: OutgoingRequest| {
            req.base_url = Some("http://fixed:1".to_string());
            req
        });
        let client = ApiClient::with_pipeline(pipeline, transport.clone());

        client.get("/x").await.unwrap();
        assert_eq!(transport.sent()[0].url().unwrap(), "http://fixed:1/x");
        assert_eq!(client.pipeline().counts(), (1, 0));
    }
}
