//! Interceptor Pipeline
//!
//! Cross-cutting policy applied to every call made through the client:
//!
//! ```text
//! OutgoingRequest → [request interceptors…] → Transport
//!                                                 ↓
//! caller ← [response interceptors…] ← Ok(IncomingResponse) | Err(ApiError)
//! ```
//!
//! Interceptors run synchronously and in registration order. They are
//! composed once when the client is built.

use std::sync::Arc;

use super::error::ApiResult;
use super::request::{IncomingResponse, OutgoingRequest};
use crate::stores::{AuthStore, SettingsStore};

/// Transform applied to each request before it is sent.
///
/// A request interceptor never rejects a request.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: OutgoingRequest) -> OutgoingRequest;
}

/// Transform applied to each outcome before the caller sees it
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, outcome: ApiResult<IncomingResponse>) -> ApiResult<IncomingResponse>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(OutgoingRequest) -> OutgoingRequest + Send + Sync,
{
    fn on_request(&self, request: OutgoingRequest) -> OutgoingRequest {
        self(request)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(ApiResult<IncomingResponse>) -> ApiResult<IncomingResponse> + Send + Sync,
{
    fn on_response(&self, outcome: ApiResult<IncomingResponse>) -> ApiResult<IncomingResponse> {
        self(outcome)
    }
}

/// Ordered request and response interceptors
#[derive(Clone, Default)]
pub struct Pipeline {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard pipeline: base address, bearer credential, logout on 401
    pub fn standard(auth: Arc<AuthStore>, settings: Arc<SettingsStore>) -> Self {
        Self::new()
            .with_request(BaseAddress::new(settings))
            .with_request(BearerAuth::new(Arc::clone(&auth)))
            .with_response(LogoutOnUnauthorized::new(auth))
    }

    pub fn with_request(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request.push(Arc::new(interceptor));
        self
    }

    pub fn with_response(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response.push(Arc::new(interceptor));
        self
    }

    pub fn apply_request(&self, request: OutgoingRequest) -> OutgoingRequest {
        self.request
            .iter()
            .fold(request, |req, interceptor| interceptor.on_request(req))
    }

    pub fn apply_response(
        &self,
        outcome: ApiResult<IncomingResponse>,
    ) -> ApiResult<IncomingResponse> {
        self.response
            .iter()
            .fold(outcome, |out, interceptor| interceptor.on_response(out))
    }

    /// Number of (request, response) interceptors
    pub fn counts(&self) -> (usize, usize) {
        (self.request.len(), self.response.len())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

/// Sets the base address from the current server settings
pub struct BaseAddress {
    settings: Arc<SettingsStore>,
}

impl BaseAddress {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

impl RequestInterceptor for BaseAddress {
    fn on_request(&self, mut request: OutgoingRequest) -> OutgoingRequest {
        request.base_url = Some(self.settings.server_address().base_url());
        request
    }
}

/// Attaches `Authorization: Bearer <token>` when a credential is stored
pub struct BearerAuth {
    auth: Arc<AuthStore>,
}

impl BearerAuth {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, mut request: OutgoingRequest) -> OutgoingRequest {
        if let Some(token) = self.auth.token().filter(|t| !t.is_empty()) {
            request.set_header("Authorization", format!("Bearer {}", token));
        }
        request
    }
}

/// Clears the credential when the server rejects it, then re-raises
pub struct LogoutOnUnauthorized {
    auth: Arc<AuthStore>,
}

impl LogoutOnUnauthorized {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}

impl ResponseInterceptor for LogoutOnUnauthorized {
    fn on_response(&self, outcome: ApiResult<IncomingResponse>) -> ApiResult<IncomingResponse> {
        if let Err(err) = &outcome {
            if err.is_unauthorized() {
                tracing::warn!("Server rejected credential, logging out");
                if let Err(e) = self.auth.logout() {
                    tracing::error!("Failed to remove persisted credential: {}", e);
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::{FailingStorage, KeyValueStorage, MemoryStorage};
    use crate::stores::Stores;

    fn stores(token: Option<&str>) -> (Stores, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let stores = Stores::load(storage.clone()).unwrap();
        stores.settings.set_server("10.0.0.5", 8080).unwrap();
        if let Some(token) = token {
            stores.auth.set_token(token).unwrap();
        }
        (stores, storage)
    }

    fn standard(stores: &Stores) -> Pipeline {
        Pipeline::standard(Arc::clone(&stores.auth), Arc::clone(&stores.settings))
    }

    #[test]
    fn test_request_gets_base_and_bearer() {
        let (stores, _) = stores(Some("abc123"));
        let pipeline = standard(&stores);

        for req in [
            OutgoingRequest::get("/files"),
            OutgoingRequest::post("/task"),
            OutgoingRequest::delete("/task/7"),
        ] {
            let req = pipeline.apply_request(req);
            assert_eq!(req.base_url.as_deref(), Some("http://10.0.0.5:8080"));
            assert_eq!(req.header_value("Authorization"), Some("Bearer abc123"));
        }
    }

    #[test]
    fn test_no_header_without_token() {
        let (stores, _) = stores(None);
        let req = standard(&stores).apply_request(OutgoingRequest::get("/files"));

        assert_eq!(req.base_url.as_deref(), Some("http://10.0.0.5:8080"));
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_empty_token_sends_no_header() {
        let (stores, _) = stores(Some("abc123"));
        stores.auth.set_token("").unwrap();

        let req = standard(&stores).apply_request(OutgoingRequest::get("/files"));
        assert_eq!(req.header_value("Authorization"), None);
        assert!(!stores.auth.is_authenticated());
    }

    #[test]
    fn test_each_request_reads_fresh_state() {
        let (stores, _) = stores(Some("first"));
        let pipeline = standard(&stores);

        let req = pipeline.apply_request(OutgoingRequest::get("/"));
        assert_eq!(req.header_value("Authorization"), Some("Bearer first"));

        stores.auth.set_token("second").unwrap();
        stores.settings.set_server("backup.internal", 9000).unwrap();

        let req = pipeline.apply_request(OutgoingRequest::get("/"));
        assert_eq!(req.header_value("Authorization"), Some("Bearer second"));
        assert_eq!(req.base_url.as_deref(), Some("http://backup.internal:9000"));

        stores.auth.logout().unwrap();
        let req = pipeline.apply_request(OutgoingRequest::get("/"));
        assert_eq!(req.header_value("Authorization"), None);
    }

    #[test]
    fn test_bearer_replaces_caller_header() {
        let (stores, _) = stores(Some("abc123"));
        let req = standard(&stores)
            .apply_request(OutgoingRequest::get("/").header("authorization", "Basic xyz"));

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_value("Authorization"), Some("Bearer abc123"));
    }

    #[test]
    fn test_unauthorized_clears_credential_and_reraises() {
        let (stores, storage) = stores(Some("abc123"));
        let pipeline = standard(&stores);

        let outcome = pipeline.apply_response(Err(ApiError::Status {
            status: 401,
            body: "token expired".to_string(),
        }));

        match outcome {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "token expired");
            }
            other => panic!("expected 401 failure, got {:?}", other),
        }
        assert!(!stores.auth.is_authenticated());
        assert_eq!(storage.get_item("token").unwrap(), None);
    }

    #[test]
    fn test_failed_logout_still_reraises() {
        let storage = Arc::new(FailingStorage {
            inner: MemoryStorage::with_entries([("token", "abc123")]),
            fail_remove: vec!["token"],
            ..Default::default()
        });
        let stores = Stores::load(storage.clone()).unwrap();
        let pipeline = standard(&stores);

        let outcome = pipeline.apply_response(Err(ApiError::Status {
            status: 401,
            body: "token expired".to_string(),
        }));

        match outcome {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "token expired");
            }
            other => panic!("expected 401 failure, got {:?}", other),
        }
        assert_eq!(stores.auth.token(), None);
        // The persisted entry survives; this process still stops sending it
        assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc123"));
        let req = pipeline.apply_request(OutgoingRequest::get("/task"));
        assert_eq!(req.header_value("Authorization"), None);
    }

    #[test]
    fn test_other_failures_keep_credential() {
        let (stores, storage) = stores(Some("abc123"));
        let pipeline = standard(&stores);

        for status in [400u16, 403, 404, 500, 503] {
            let outcome = pipeline.apply_response(Err(ApiError::Status {
                status,
                body: String::new(),
            }));
            assert_eq!(outcome.unwrap_err().status(), Some(status));
        }

        let outcome = pipeline.apply_response(Err(ApiError::InvalidRequest("x".into())));
        assert!(matches!(outcome, Err(ApiError::InvalidRequest(_))));

        assert_eq!(stores.auth.token().as_deref(), Some("abc123"));
        assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_success_passes_through() {
        let (stores, _) = stores(Some("abc123"));
        let response = IncomingResponse::new(200, "ok");

        let outcome = standard(&stores).apply_response(Ok(response.clone()));
        assert_eq!(outcome.unwrap(), response);
        assert!(stores.auth.is_authenticated());
    }

    #[test]
    fn test_interceptors_run_in_order() {
        let pipeline = Pipeline::new()
            .with_request(|req: OutgoingRequest| req.header("X-Trace", "first"))
            .with_request(|mut req: OutgoingRequest| {
                let prev = req.header_value("X-Trace").unwrap_or_default().to_string();
                req.set_header("X-Trace", format!("{},second", prev));
                req
            });

        let req = pipeline.apply_request(OutgoingRequest::get("/"));
        assert_eq!(req.header_value("X-Trace"), Some("first,second"));
        assert_eq!(pipeline.counts(), (2, 0));
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::new();
        let req = OutgoingRequest::get("/files");
        assert_eq!(pipeline.apply_request(req.clone()), req);

        let outcome = pipeline.apply_response(Err(ApiError::Decode("x".into())));
        assert!(matches!(outcome, Err(ApiError::Decode(_))));
    }
}
