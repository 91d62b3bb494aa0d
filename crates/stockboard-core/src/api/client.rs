//! API client for communicating with the stockboard REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! JSON requests. The client is built once per process and cloned freely.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::{MemoryTokenStore, TokenStore};
use crate::config::Config;
use crate::navigation::{LogNavigator, Navigator};

use super::interceptor::{
    AuthHeaderInterceptor, RequestInterceptor, ResponseInterceptor, UnauthorizedInterceptor,
};
use super::ApiError;

/// Default content type sent with every request
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// API client for the stockboard backend.
/// Clone is cheap - reqwest::Client and the interceptors are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    login_endpoint: String,
    store: Arc<dyn TokenStore>,
    request_interceptors: Arc<Vec<Arc<dyn RequestInterceptor>>>,
    response_interceptors: Arc<Vec<Arc<dyn ResponseInterceptor>>>,
}

/// Builder for `ApiClient`; installs the auth header and 401 interceptors.
pub struct ApiClientBuilder {
    config: Config,
    store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl ApiClientBuilder {
    /// Start a builder from `config`
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            navigator: None,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }

    /// Token slot read on every request; defaults to an in-memory store
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Navigation capability invoked with the login route on 401
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Extra request hook, run after the Authorization header is set
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Extra response hook, run after the 401 handler
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Validate the config and create the client
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config;
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
        );

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()) as Arc<dyn TokenStore>);
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(LogNavigator) as Arc<dyn Navigator>);

        let mut request_interceptors: Vec<Arc<dyn RequestInterceptor>> = vec![Arc::new(
            AuthHeaderInterceptor::new(store.clone(), config.auth_scheme.clone()),
        )];
        request_interceptors.extend(self.request_interceptors);

        let mut response_interceptors: Vec<Arc<dyn ResponseInterceptor>> =
            vec![Arc::new(UnauthorizedInterceptor::new(
                store.clone(),
                navigator,
                config.login_route.clone(),
            ))];
        response_interceptors.extend(self.response_interceptors);

        Ok(ApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_endpoint: config.login_endpoint,
            store,
            request_interceptors: Arc::new(request_interceptors),
            response_interceptors: Arc::new(response_interceptors),
        })
    }
}

impl ApiClient {
    /// Start building a client from `config`
    pub fn builder(config: Config) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Create a client for `base_url` with default settings and the given store
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let config = Config {
            base_url: base_url.into(),
            ..Config::default()
        };
        Self::builder(config).token_store(store).build()
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path the login flow posts credentials to
    pub fn login_endpoint(&self) -> &str {
        &self.login_endpoint
    }

    /// Shared handle to the token slot the interceptors use
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        self.store.clone()
    }

    /// Join `path` onto the base URL, keeping any path prefix the base has.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    fn outgoing_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for interceptor in self.request_interceptors.iter() {
            interceptor.on_request(&mut headers);
        }
        headers
    }

    /// Run the response interceptors, then turn error statuses into `ApiError`.
    async fn check_response(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        for interceptor in self.response_interceptors.iter() {
            interceptor.on_response(status);
        }

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a success body; an empty body decodes as JSON `null`.
    async fn parse_body<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&bytes)
        };
        parsed.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .client
            .request(method, url.clone())
            .headers(self.outgoing_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = self.check_response(response).await?;
        Self::parse_body(response, &url).await
    }

    /// GET `path` and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// POST `body` as JSON to `path`
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// PUT `body` as JSON to `path`
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// PATCH `body` as JSON to `path`
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// DELETE `path` and decode the JSON response
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    /// Untyped request returning the raw JSON body
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(method, path, body).await
    }
}
