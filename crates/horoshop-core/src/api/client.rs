//! API client for the Horoshop REST API.
//!
//! `ApiClient` drives the request pipeline: it attaches the session token,
//! re-authenticates once when a call comes back 401, and exposes the typed
//! resource operations (orders, catalog, webhook subscriptions).

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{AuthManager, Credentials, Fingerprint};
use crate::models::{lenient, CatalogQuery, Order, OrderFilters, Product};
use crate::storage::TokenStore;

use super::pipeline::{LastResponse, Pipeline};
use super::request::{RequestDescriptor, ResponseEnvelope};
use super::transport::{ReqwestTransport, Transport};
use super::{ApiError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Read timeout for a single request, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Re-authentications allowed per top-level call.
/// One is enough to recover from an expired token without looping on bad credentials.
const MAX_REAUTH_ATTEMPTS: u32 = 1;

const ORDERS_PATH: &str = "orders/get";
const CATALOG_PATH: &str = "catalog/export";
const HOOK_SUBSCRIBE_PATH: &str = "hooks/subscribe/";
const HOOK_UNSUBSCRIBE_PATH: &str = "hooks/unSubscribe/";

/// Status the API answers a successful webhook subscription with
const STATUS_CREATED: u16 = 201;

/// Status the API answers a successful webhook removal with
const STATUS_GONE: u16 = 410;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Client for one set of credentials.
///
/// The client is `Send + Sync`; concurrent callers share the cached token.
pub struct ApiClient {
    pipeline: Pipeline,
    auth: AuthManager,
}

impl ApiClient {
    /// Connect using the default reqwest transport.
    ///
    /// Fails fast: with no cached token this logs in before returning.
    pub async fn connect(credentials: Credentials, store: Arc<dyn TokenStore>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(credentials, store, transport, ClientOptions::default()).await
    }

    /// Connect through a caller-supplied transport
    pub async fn with_transport(
        credentials: Credentials,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
        options: ClientOptions,
    ) -> Result<Self> {
        let pipeline = Pipeline::new(transport, credentials.api_root(), options.timeout);
        let auth = AuthManager::initialize(credentials, store, &pipeline).await?;
        Ok(Self { pipeline, auth })
    }

    /// Run one logical call.
    ///
    /// A 401 triggers a single re-login followed by a single retry, whatever
    /// the login outcome. A second 401 is returned to the caller as is.
    /// Requests built with `without_token` are never retried, since a new
    /// token would not change them.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope> {
        if self.auth.is_api_unavailable() {
            return Err(ApiError::ApiUnavailable);
        }

        let mut reauth_attempts = 0;
        loop {
            let token = if descriptor.include_token {
                self.auth.current_token().await
            } else {
                None
            };

            let response = self.pipeline.send(descriptor, token.as_deref()).await?;

            let may_retry = descriptor.include_token && reauth_attempts < MAX_REAUTH_ATTEMPTS;
            if !(response.is(401) && may_retry) {
                return Ok(response);
            }

            reauth_attempts += 1;
            warn!(path = %descriptor.path, "Token rejected, re-authenticating");

            match self.auth.login(&self.pipeline).await {
                Ok(true) => {}
                Ok(false) => warn!("Re-authentication failed, retrying with the old token"),
                Err(e @ ApiError::InvalidResponse(_)) => {
                    warn!(error = %e, "Re-authentication failed, retrying with the old token")
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ===== Orders =====

    /// Fetch one order. A missing order is `None`, not an error.
    pub async fn get_order_by_id(&self, id: i64) -> Result<Option<Order>> {
        let orders = self.list_orders(&[id], &OrderFilters::default()).await?;
        Ok(orders.and_then(|orders| orders.into_iter().next()))
    }

    /// Fetch orders by id and filters.
    /// Returns `None` on a non-200 answer or when nothing matches.
    pub async fn list_orders(&self, ids: &[i64], filters: &OrderFilters) -> Result<Option<Vec<Order>>> {
        let descriptor = RequestDescriptor::get(ORDERS_PATH).params(filters.to_params(ids));
        let response = self.execute(&descriptor).await?;
        extract_list(&response, "/response/orders", "orders")
    }

    // ===== Catalog =====

    /// Export catalog entries.
    /// Returns `None` on a non-200 answer or when nothing matches.
    pub async fn list_catalog(&self, query: &CatalogQuery) -> Result<Option<Vec<Product>>> {
        let descriptor = RequestDescriptor::get(CATALOG_PATH).params(query.to_params());
        let response = self.execute(&descriptor).await?;
        extract_list(&response, "/response/products", "products")
    }

    pub async fn get_product_by_article(&self, article: &str) -> Result<Option<Product>> {
        let query = CatalogQuery::default().expr("article", article).limit(1);
        let products = self.list_catalog(&query).await?;
        Ok(products.and_then(|products| products.into_iter().next()))
    }

    // ===== Webhooks =====

    /// Subscribe `handler_uri` to `event`. Returns the subscription id on 201,
    /// `None` on any other status.
    pub async fn bind(&self, event: &str, handler_uri: &str) -> Result<Option<i64>> {
        let descriptor = RequestDescriptor::post(HOOK_SUBSCRIBE_PATH)
            .param("event", event)
            .param("target_url", handler_uri);
        let response = self.execute(&descriptor).await?;

        if !response.is(STATUS_CREATED) {
            warn!(
                event = event,
                status = response.status,
                body = %ApiError::truncate_body(&response.raw_body),
                "Webhook subscription failed"
            );
            return Ok(None);
        }

        let id = response
            .lookup("/id")
            .or_else(|| response.lookup("/response/id"))
            .and_then(lenient::as_i64);
        if id.is_none() {
            warn!(event = event, "Webhook subscription created but no id returned");
        }
        Ok(id)
    }

    /// Remove a webhook subscription. Only a 410 answer counts as success.
    pub async fn unbind(&self, id: i64, handler_uri: &str) -> Result<bool> {
        let descriptor = RequestDescriptor::post(HOOK_UNSUBSCRIBE_PATH)
            .param("id", id)
            .param("target_url", handler_uri);
        let response = self.execute(&descriptor).await?;

        if !response.is(STATUS_GONE) {
            debug!(id = id, status = response.status, "Webhook unsubscribe did not take effect");
        }
        Ok(response.is(STATUS_GONE))
    }

    // ===== State =====

    pub async fn current_token(&self) -> Option<String> {
        self.auth.current_token().await
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        self.auth.fingerprint()
    }

    pub fn credentials(&self) -> &Credentials {
        self.auth.credentials()
    }

    pub fn is_api_unavailable(&self) -> bool {
        self.auth.is_api_unavailable()
    }

    /// Status and raw body of the most recent request, for diagnostics
    pub fn last_response(&self) -> Option<LastResponse> {
        self.pipeline.last_response()
    }
}

/// Pull a non-empty list out of a 200 response
fn extract_list<T: DeserializeOwned>(
    response: &ResponseEnvelope,
    pointer: &str,
    what: &str,
) -> Result<Option<Vec<T>>> {
    if !response.is(200) {
        debug!(status = response.status, what = what, "Non-200 response, returning no results");
        return Ok(None);
    }

    // Some endpoints return keyed objects instead of arrays
    let items: Vec<Value> = match response.lookup(pointer) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    };
    if items.is_empty() {
        return Ok(None);
    }

    serde_json::from_value(Value::Array(items))
        .map(Some)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;
    use crate::testing::StubTransport;

    const AUTH_OK: &str = r#"{"status":"OK","response":{"token":"t-1"}}"#;
    const AUTH_OK_2: &str = r#"{"status":"OK","response":{"token":"t-2"}}"#;
    const ORDER_42: &str = r#"{"status":"OK","response":{"orders":[{"order_id":42,"stat_status":1}]}}"#;

    fn credentials() -> Credentials {
        Credentials::new("https://shop.test", "api", "secret").unwrap()
    }

    async fn client(stub: &Arc<StubTransport>) -> ApiClient {
        ApiClient::with_transport(
            credentials(),
            Arc::new(MemoryTokenStore::new()),
            stub.clone(),
            ClientOptions::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_construction_caches_token() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);

        let client = client(&stub).await;

        assert_eq!(client.current_token().await.as_deref(), Some("t-1"));
        assert_eq!(client.fingerprint(), &credentials().fingerprint());
    }

    #[tokio::test]
    async fn test_construction_fails_when_login_rejected() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 403, "denied");

        let result = ApiClient::with_transport(
            credentials(),
            Arc::new(MemoryTokenStore::new()),
            stub.clone(),
            ClientOptions::default(),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Connection(_))));
    }

    #[tokio::test]
    async fn test_get_order_by_id() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("orders/get", 200, ORDER_42);
        let client = client(&stub).await;

        let order = client.get_order_by_id(42).await.unwrap().unwrap();

        assert_eq!(order.id, 42);
        let request = stub.requests().pop().unwrap();
        assert_eq!(
            request.url,
            "https://shop.test/api/orders/get?ids%5B%5D=42&token=t-1"
        );
    }

    #[tokio::test]
    async fn test_single_401_reauthenticates_once_and_retries() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK).respond("auth", 200, AUTH_OK_2);
        stub.respond("orders/get", 401, "").respond("orders/get", 200, ORDER_42);
        let client = client(&stub).await;

        let orders = client.list_orders(&[42], &OrderFilters::default()).await.unwrap();

        assert_eq!(orders.unwrap()[0].id, 42);
        assert_eq!(stub.count("auth"), 2);
        assert_eq!(stub.count("orders/get"), 2);
        assert_eq!(client.current_token().await.as_deref(), Some("t-2"));

        let retried = stub.requests().pop().unwrap();
        assert!(retried.url.ends_with("token=t-2"));
    }

    #[tokio::test]
    async fn test_repeated_401_does_not_loop() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("orders/get", 401, r#"{"status":"UNAUTHORIZED"}"#);
        let client = client(&stub).await;

        let response = client
            .execute(&RequestDescriptor::get("orders/get"))
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(stub.count("auth"), 2);
        assert_eq!(stub.count("orders/get"), 2);
        assert_eq!(
            client.last_response().map(|last| last.status),
            Some(401)
        );

        // The budget belongs to one call; the next call may re-authenticate again
        let orders = client.list_orders(&[], &OrderFilters::default()).await.unwrap();
        assert_eq!(orders, None);
        assert_eq!(stub.count("auth"), 3);
        assert_eq!(stub.count("orders/get"), 4);
    }

    #[tokio::test]
    async fn test_failed_refresh_still_retries_once() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK).respond("auth", 500, "");
        stub.respond("orders/get", 401, "").respond("orders/get", 200, ORDER_42);
        let client = client(&stub).await;

        let order = client.get_order_by_id(42).await.unwrap();

        assert!(order.is_some());
        assert_eq!(stub.count("orders/get"), 2);
        assert_eq!(client.current_token().await.as_deref(), Some("t-1"));
    }

    #[tokio::test]
    async fn test_tokenless_refresh_answer_still_retries_once() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK).respond("auth", 200, r#"{"response":{}}"#);
        stub.respond("orders/get", 401, "").respond("orders/get", 200, ORDER_42);
        let client = client(&stub).await;

        let order = client.get_order_by_id(42).await.unwrap();

        assert_eq!(order.map(|o| o.id), Some(42));
        assert_eq!(stub.count("auth"), 2);
        assert_eq!(stub.count("orders/get"), 2);
        assert_eq!(client.current_token().await.as_deref(), Some("t-1"));
        assert!(stub.requests().pop().unwrap().url.ends_with("token=t-1"));
    }

    #[tokio::test]
    async fn test_orders_with_string_fields_are_returned() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond(
            "orders/get",
            200,
            r#"{"response":{"orders":[
                {"order_id":"42","total_sum":"1250.50"},
                {"id":43,"order_id":43,"stat_status":"2"}
            ]}}"#,
        );
        let client = client(&stub).await;

        let orders = client
            .list_orders(&[42, 43], &OrderFilters::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, 42);
        assert_eq!(orders[0].total_sum, Some(1250.5));
        assert_eq!(orders[1].id, 43);
        assert_eq!(orders[1].stat_status, Some(2));
    }

    #[tokio::test]
    async fn test_list_orders_is_idempotent() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("orders/get", 200, ORDER_42);
        let client = client(&stub).await;

        let first = client.list_orders(&[], &OrderFilters::default()).await.unwrap();
        let second = client.list_orders(&[], &OrderFilters::default()).await.unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_orders_empty_or_error_is_none() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("orders/get", 200, r#"{"response":{"orders":[]}}"#)
            .respond("orders/get", 500, "boom");
        let client = client(&stub).await;

        assert_eq!(client.get_order_by_id(1).await.unwrap(), None);
        assert_eq!(client.get_order_by_id(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_orders_sends_filters() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("orders/get", 200, ORDER_42);
        let client = client(&stub).await;

        let filters = OrderFilters::default().status(3).additional_data(true);
        client.list_orders(&[1, 2], &filters).await.unwrap();

        let request = stub.requests().pop().unwrap();
        assert_eq!(
            request.url,
            "https://shop.test/api/orders/get?additionalData=1&ids%5B%5D=1&ids%5B%5D=2&status=3&token=t-1"
        );
    }

    #[tokio::test]
    async fn test_malformed_orders_are_invalid_response() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("orders/get", 200, r#"{"response":{"orders":[{"no_id":true}]}}"#);
        let client = client(&stub).await;

        let err = client.get_order_by_id(1).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_get_product_by_article() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond(
            "catalog/export",
            200,
            r#"{"response":{"products":[{"article":"A-1","price":10}]}}"#,
        );
        let client = client(&stub).await;

        let product = client.get_product_by_article("A-1").await.unwrap().unwrap();

        assert_eq!(product.article.as_deref(), Some("A-1"));
        let request = stub.requests().pop().unwrap();
        assert_eq!(
            request.url,
            "https://shop.test/api/catalog/export?expr%5Barticle%5D=A-1&limit=1&token=t-1"
        );
    }

    #[tokio::test]
    async fn test_list_catalog_non_200_is_none() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("catalog/export", 400, r#"{"status":"EMPTY"}"#);
        let client = client(&stub).await;

        let products = client.list_catalog(&CatalogQuery::default()).await.unwrap();
        assert_eq!(products, None);
    }

    #[tokio::test]
    async fn test_bind_returns_id_on_created() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("hooks/subscribe/", 201, r#"{"id":7}"#);
        let client = client(&stub).await;

        let id = client.bind("order.created", "http://h/cb").await.unwrap();

        assert_eq!(id, Some(7));
        let request = stub.requests().pop().unwrap();
        assert_eq!(
            request.body.as_deref(),
            Some("event=order.created&target_url=http%3A%2F%2Fh%2Fcb&token=t-1")
        );
    }

    #[tokio::test]
    async fn test_bind_failure_returns_none_without_relogin() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("hooks/subscribe/", 403, r#"{"status":"FORBIDDEN"}"#);
        let client = client(&stub).await;

        let id = client.bind("order.created", "http://h/cb").await.unwrap();

        assert_eq!(id, None);
        assert_eq!(stub.count("auth"), 1);
        assert_eq!(client.current_token().await.as_deref(), Some("t-1"));
    }

    #[tokio::test]
    async fn test_bind_success_on_200_is_not_accepted() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("hooks/subscribe/", 200, r#"{"id":7}"#);
        let client = client(&stub).await;

        assert_eq!(client.bind("order.created", "http://h/cb").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unbind_status_contract() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("hooks/unSubscribe/", 410, "")
            .respond("hooks/unSubscribe/", 200, "");
        let client = client(&stub).await;

        assert!(client.unbind(7, "http://h/cb").await.unwrap());
        assert!(!client.unbind(7, "http://h/cb").await.unwrap());

        let request = stub.requests().pop().unwrap();
        assert_eq!(
            request.body.as_deref(),
            Some("id=7&target_url=http%3A%2F%2Fh%2Fcb&token=t-1")
        );
    }

    #[tokio::test]
    async fn test_api_unavailable_fails_fast() {
        let stub = Arc::new(StubTransport::new());
        let store = Arc::new(MemoryTokenStore::new());
        store.set(credentials().fingerprint().as_str(), "stale").unwrap();
        stub.respond("auth", 404, "");
        stub.respond("orders/get", 401, "");

        let client = ApiClient::with_transport(
            credentials(),
            store,
            stub.clone(),
            ClientOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(client.get_order_by_id(1).await.unwrap(), None);
        assert!(client.is_api_unavailable());
        let sent = stub.requests().len();

        let err = client.get_order_by_id(1).await.unwrap_err();
        assert!(matches!(err, ApiError::ApiUnavailable));
        assert_eq!(stub.requests().len(), sent);
    }

    #[tokio::test]
    async fn test_token_less_requests_are_not_retried() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("public/ping", 401, "");
        let client = client(&stub).await;

        let response = client
            .execute(&RequestDescriptor::get("public/ping").without_token())
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(stub.count("public/ping"), 1);
        assert_eq!(stub.count("auth"), 1);
        assert_eq!(stub.requests().pop().unwrap().url, "https://shop.test/api/public/ping");
    }

    #[tokio::test]
    async fn test_bind_accepts_string_id() {
        let stub = Arc::new(StubTransport::new());
        stub.respond("auth", 200, AUTH_OK);
        stub.respond("hooks/subscribe/", 201, r#"{"id":"9"}"#);
        let client = client(&stub).await;

        assert_eq!(client.bind("order.created", "http://h/cb").await.unwrap(), Some(9));
    }
}
