//! HttpQuery - 빌더 방식의 범용 Query 구현

use super::{CacheLifetime, Parameters, Query, ToleratedResponse, DEFAULT_SLOW_THRESHOLD};
use crate::error::FetchError;
use crate::transport::RequestOptions;
use refetch_foundation::{
    url_cache_key, validate_service_name, CircuitBreaker, Environment, Error, FetchConfig, Payload,
    Result, Timeouts,
};
use reqwest::Method;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Failure classifier: `true` when the error should trip the breaker
pub type FailureClassifier = Arc<dyn Fn(&FetchError) -> bool + Send + Sync>;

/// Payload transform
pub type PayloadTransform = Arc<dyn Fn(Option<&Payload>) -> Option<Value> + Send + Sync>;

type OptionsOverride = Arc<dyn Fn(RequestOptions) -> RequestOptions + Send + Sync>;

/// Query configured through builder methods
///
/// The URL is the base URL for the current environment with the ordered
/// parameters appended as query string.
///
/// ```ignore
/// let query = HttpQuery::new("programmes", "http://example.com/programmes.json")?
///     .param("pid", "b006q2x0")
///     .force_max_age(600);
/// ```
#[derive(Clone)]
pub struct HttpQuery {
    service_name: String,
    base_url: Url,
    environment_urls: HashMap<Environment, Url>,
    environment: Environment,
    method: Method,
    params: Parameters,
    config: Map<String, Value>,
    headers: BTreeMap<String, String>,
    cache_key: Option<String>,
    lifetime: CacheLifetime,
    short_timeouts: Timeouts,
    long_timeouts: Timeouts,
    slow_threshold: Duration,
    can_cache: bool,
    tolerated: ToleratedResponse,
    breaker: Option<Arc<dyn CircuitBreaker>>,
    classifier: Option<FailureClassifier>,
    transform: Option<PayloadTransform>,
    options_override: Option<OptionsOverride>,
}

impl HttpQuery {
    pub fn new(service_name: impl Into<String>, base_url: &str) -> Result<Self> {
        let service_name = service_name.into();
        validate_service_name(&service_name)?;

        Ok(Self {
            service_name,
            base_url: parse_url(base_url)?,
            environment_urls: HashMap::new(),
            environment: Environment::default(),
            method: Method::GET,
            params: Parameters::new(),
            config: Map::new(),
            headers: BTreeMap::new(),
            cache_key: None,
            lifetime: CacheLifetime::default(),
            short_timeouts: Timeouts::short_default(),
            long_timeouts: Timeouts::long_default(),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            can_cache: true,
            tolerated: ToleratedResponse::default(),
            breaker: None,
            classifier: None,
            transform: None,
            options_override: None,
        })
    }

    /// Seed defaults (ages, timeouts, slow threshold, environment) from config
    pub fn from_config(
        service_name: impl Into<String>,
        base_url: &str,
        config: &FetchConfig,
    ) -> Result<Self> {
        let mut query = Self::new(service_name, base_url)?;
        query.lifetime = CacheLifetime::new(config.default_max_age_secs, config.default_stale_age_secs);
        query.short_timeouts = config.short_timeouts;
        query.long_timeouts = config.long_timeouts;
        query.slow_threshold = config.slow_threshold();
        query.environment = config.environment;
        Ok(query)
    }

    // ========================================================================
    // Parameters / environment / config
    // ========================================================================

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.params.set(name, value);
        self
    }

    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn get_param_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.params.get_or(name, default)
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) -> &mut Self {
        self.environment = environment;
        self
    }

    /// Environment by name, rejecting unknown ones
    pub fn set_environment_name(&mut self, name: &str) -> Result<&mut Self> {
        let environment = name.parse::<Environment>().map_err(|_| {
            Error::InvalidInput(format!(
                "\"{}\" is not a supported environment for {}",
                name, self.service_name
            ))
        })?;
        Ok(self.set_environment(environment))
    }

    /// Base URL used while the query targets `environment`
    pub fn environment_url(mut self, environment: Environment, base_url: &str) -> Result<Self> {
        self.environment_urls.insert(environment, parse_url(base_url)?);
        Ok(self)
    }

    /// Free-form configuration (API keys etc.)
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn set_config(&mut self, config: Map<String, Value>) -> &mut Self {
        self.config = config;
        self
    }

    pub fn config_value(&self, name: &str) -> Option<&Value> {
        self.config.get(name)
    }

    // ========================================================================
    // Request
    // ========================================================================

    pub fn method_override(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn short_timeouts_override(mut self, timeouts: Timeouts) -> Self {
        self.short_timeouts = timeouts;
        self
    }

    pub fn long_timeouts_override(mut self, timeouts: Timeouts) -> Self {
        self.long_timeouts = timeouts;
        self
    }

    pub fn slow_threshold_override(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn override_options<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestOptions) -> RequestOptions + Send + Sync + 'static,
    {
        self.options_override = Some(Arc::new(f));
        self
    }

    // ========================================================================
    // Cache
    // ========================================================================

    pub fn cache_key_override(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn default_ages(mut self, max_age: u64, stale_age: u64) -> Self {
        self.lifetime.default_max_age = max_age;
        self.lifetime.default_stale_age = stale_age;
        self
    }

    pub fn force_max_age(mut self, secs: u64) -> Self {
        self.lifetime = self.lifetime.force_max_age(secs);
        self
    }

    pub fn force_stale_age(mut self, secs: u64) -> Self {
        self.lifetime = self.lifetime.force_stale_age(secs);
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.can_cache = false;
        self
    }

    // ========================================================================
    // Failure handling
    // ========================================================================

    pub fn breaker(mut self, breaker: Arc<dyn CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn failure_classifier<F>(mut self, f: F) -> Self
    where
        F: Fn(&FetchError) -> bool + Send + Sync + 'static,
    {
        self.classifier = Some(Arc::new(f));
        self
    }

    /// Upstream statuses that are valid answers rather than failures (e.g. 404)
    pub fn tolerate_statuses(self, statuses: impl IntoIterator<Item = u16>) -> Self {
        let statuses: Vec<u16> = statuses.into_iter().collect();
        self.failure_classifier(move |err| match err.status() {
            Some(status) => !statuses.contains(&status),
            None => true,
        })
    }

    pub fn tolerated(mut self, policy: ToleratedResponse) -> Self {
        self.tolerated = policy;
        self
    }

    pub fn transform_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Payload>) -> Option<Value> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    fn current_base(&self) -> &Url {
        self.environment_urls
            .get(&self.environment)
            .unwrap_or(&self.base_url)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidInput(format!("Invalid URL {}: {}", raw, e)))?;
    if !["http", "https"].contains(&url.scheme()) {
        return Err(Error::InvalidInput(format!(
            "Only http/https URLs are allowed, got: {}",
            url.scheme()
        )));
    }
    Ok(url)
}

impl Query for HttpQuery {
    fn service_name(&self) -> &str {
        &self.service_name
    }

    fn url(&self) -> String {
        let mut url = self.current_base().clone();
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        url.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn cache_key(&self) -> String {
        self.cache_key
            .clone()
            .unwrap_or_else(|| url_cache_key(&self.url()))
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn request_headers(&self) -> BTreeMap<String, String> {
        self.headers.clone()
    }

    fn override_request_options(&self, options: RequestOptions) -> RequestOptions {
        match &self.options_override {
            Some(f) => f(options),
            None => options,
        }
    }

    fn short_timeouts(&self) -> Timeouts {
        self.short_timeouts
    }

    fn long_timeouts(&self) -> Timeouts {
        self.long_timeouts
    }

    fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    fn cache_lifetime(&self) -> CacheLifetime {
        self.lifetime
    }

    fn can_cache(&self) -> bool {
        self.can_cache
    }

    fn is_failure(&self, error: &FetchError) -> bool {
        match &self.classifier {
            Some(classify) => classify(error),
            None => true,
        }
    }

    fn tolerated_response(&self) -> ToleratedResponse {
        self.tolerated
    }

    fn circuit_breaker(&self) -> Option<Arc<dyn CircuitBreaker>> {
        self.breaker.clone()
    }

    fn transform(&self, payload: Option<&Payload>) -> Option<Value> {
        match &self.transform {
            Some(f) => f(payload),
            None => payload.map(|payload| {
                serde_json::from_str(&payload.body)
                    .unwrap_or_else(|_| Value::String(payload.body.clone()))
            }),
        }
    }
}

impl fmt::Display for HttpQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

impl fmt::Debug for HttpQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpQuery")
            .field("service_name", &self.service_name)
            .field("url", &self.url())
            .field("environment", &self.environment)
            .field("lifetime", &self.lifetime)
            .field("can_cache", &self.can_cache)
            .field("has_breaker", &self.breaker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn programmes() -> HttpQuery {
        HttpQuery::new("mock-programmes", "http://example.com/programmes.json").unwrap()
    }

    #[test]
    fn test_url_with_params() {
        let query = programmes().param("pid", "b006q2x0").param("page", 2);
        assert_eq!(
            query.url(),
            "http://example.com/programmes.json?pid=b006q2x0&page=2"
        );
        assert_eq!(query.to_string(), query.url());
        assert_eq!(query.get_param("page"), Some("2"));
        assert_eq!(query.get_param_or("limit", "10"), "10");
    }

    #[test]
    fn test_params_are_encoded() {
        let query = programmes().param("q", "a b&c");
        assert_eq!(query.url(), "http://example.com/programmes.json?q=a+b%26c");
    }

    #[test]
    fn test_invalid_construction() {
        assert!(HttpQuery::new("Bad Name", "http://example.com").is_err());
        assert!(HttpQuery::new("ok", "not a url").is_err());
        assert!(HttpQuery::new("ok", "ftp://example.com").is_err());
    }

    #[test]
    fn test_environment() {
        let mut query = programmes()
            .environment_url(Environment::Test, "http://test.example.com/programmes.json")
            .unwrap();
        assert_eq!(query.environment(), Environment::Live);
        assert_eq!(query.url(), "http://example.com/programmes.json");

        query.set_environment_name("test").unwrap();
        assert_eq!(query.url(), "http://test.example.com/programmes.json");

        let err = query.set_environment_name("qa").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: \"qa\" is not a supported environment for mock-programmes"
        );
        assert_eq!(query.environment(), Environment::Test);
    }

    #[test]
    fn test_cache_key() {
        let query = programmes().param("pid", "x");
        assert_eq!(query.cache_key(), url_cache_key(&query.url()));
        assert_eq!(query.cache_key_override("custom").cache_key(), "custom");
    }

    #[test]
    fn test_tolerate_statuses() {
        let query = programmes().tolerate_statuses([404]);
        assert!(!query.is_failure(&FetchError::from_http_status(404, "")));
        assert!(query.is_failure(&FetchError::from_http_status(500, "")));
        assert!(query.is_failure(&FetchError::Timeout(1)));
    }

    #[test]
    fn test_from_config() {
        let mut config = FetchConfig::default();
        config.default_max_age_secs = 120;
        config.default_stale_age_secs = 30;
        config.slow_threshold_ms = 500;
        config.environment = Environment::Stage;

        let query = HttpQuery::from_config("users", "http://localhost/users", &config).unwrap();
        assert_eq!(query.cache_lifetime(), CacheLifetime::new(120, 30));
        assert_eq!(query.slow_threshold(), Duration::from_millis(500));
        assert_eq!(query.environment(), Environment::Stage);
    }

    #[test]
    fn test_config_bag() {
        let mut query = programmes();
        let mut config = Map::new();
        config.insert("apiKey".into(), Value::String("secret".into()));
        query.set_config(config);
        assert_eq!(query.config_value("apiKey"), Some(&Value::String("secret".into())));
        assert_eq!(query.config().len(), 1);
    }

    #[test]
    fn test_custom_transform() {
        let query = programmes().transform_with(|payload| {
            payload.map(|p| Value::from(p.body.len() as u64))
        });
        assert_eq!(query.transform(Some(&Payload::ok("abcd"))), Some(Value::from(4u64)));
        assert_eq!(query.transform(None), None);
    }
}
