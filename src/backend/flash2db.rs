use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::time::Duration;

use super::{CallError, Caller, Function, Param};
use crate::models::GameCategory;

/// Path segments between the base URL and `{service}.{function}`.
pub const PATH_PREFIX: [&str; 2] = ["amfphp", "json.php"];

/// Service answering `loginCheck` regardless of category.
pub const SERVICE_CLIENT: &str = "Client";

/// Maps game categories to backend service names.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMap {
    services: HashMap<GameCategory, String>,
}

impl Default for ServiceMap {
    fn default() -> Self {
        let mut services = HashMap::new();
        services.insert(5145, "casino.slot.line243.BuBuGaoSheng".to_string());
        services.insert(5156, "casino.slot.crash.ZumaEmpire".to_string());
        Self { services }
    }
}

impl ServiceMap {
    /// Parse `category=service` pairs separated by commas.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut services = HashMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (category, service) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected category=service, got {pair:?}"))?;
            let category: GameCategory = category
                .trim()
                .parse()
                .map_err(|_| format!("invalid game category {category:?}"))?;
            let service = service.trim();
            if service.is_empty() {
                return Err(format!("empty service name for category {category}"));
            }
            services.insert(category, service.to_string());
        }
        Ok(Self { services })
    }

    pub fn get(&self, category: GameCategory) -> Option<&str> {
        self.services.get(&category).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// HTTP GET adapter for the PHP json.php RPC bridge.
pub struct Flash2db {
    client: Client,
    base_url: Url,
    services: ServiceMap,
}

impl Flash2db {
    pub fn new(
        base_url: &str,
        services: ServiceMap,
        timeout: Option<Duration>,
    ) -> Result<Self, CallError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CallError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CallError::InvalidBaseUrl(base_url.to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            services,
        })
    }

    pub fn service_for(&self, category: GameCategory, function: Function) -> Result<&str, CallError> {
        if function == Function::LoginCheck {
            return Ok(SERVICE_CLIENT);
        }
        self.services
            .get(category)
            .ok_or(CallError::UnknownService { category })
    }

    /// `{base}/amfphp/json.php/{service}.{function}/{p1}/{p2}/...` with every
    /// param percent-encoded as a single path segment.
    pub fn url_for(
        &self,
        category: GameCategory,
        function: Function,
        params: &[Param],
    ) -> Result<Url, CallError> {
        let service = self.service_for(category, function)?;
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CallError::InvalidBaseUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(PATH_PREFIX)
                .push(&format!("{service}.{function}"));
            for param in params {
                let segment = param.to_string();
                if segment == "." || segment == ".." {
                    return Err(CallError::InvalidParam(segment));
                }
                segments.push(&segment);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, CallError> {
        let resp = self.client.get(url.clone()).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CallError::Status { status, body });
        }

        let body = resp.bytes().await?;
        tracing::debug!(url = %url, response = %String::from_utf8_lossy(&body), "backend call");
        Ok(body.to_vec())
    }
}

impl Caller for Flash2db {
    fn call<'a>(
        &'a self,
        category: GameCategory,
        function: Function,
        params: &'a [Param],
    ) -> BoxFuture<'a, Result<Vec<u8>, CallError>> {
        async move {
            let url = self.url_for(category, function, params)?;
            self.get(url).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(base: &str) -> Flash2db {
        Flash2db::new(base, ServiceMap::default(), None).unwrap()
    }

    fn url(base: &str, category: GameCategory, function: Function, params: &[Param]) -> String {
        adapter(base)
            .url_for(category, function, params)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_url_with_params() {
        assert_eq!(
            url(
                "http://backend",
                5145,
                Function::LoginCheck,
                &[Param::from("someSID"), Param::from("127.0.0.1")],
            ),
            "http://backend/amfphp/json.php/Client.loginCheck/someSID/127.0.0.1"
        );
    }

    #[test]
    fn test_url_without_params() {
        assert_eq!(
            url("http://backend", 5156, Function::BeginGame, &[]),
            "http://backend/amfphp/json.php/casino.slot.crash.ZumaEmpire.beginGame"
        );
    }

    #[test]
    fn test_login_check_always_targets_client_service() {
        let f = adapter("http://backend");
        assert_eq!(f.service_for(9999, Function::LoginCheck).unwrap(), "Client");
        assert_eq!(f.service_for(5145, Function::LoginCheck).unwrap(), "Client");
    }

    #[test]
    fn test_game_service_resolved_by_category() {
        let f = adapter("http://backend");
        assert_eq!(
            f.service_for(5145, Function::BeginGame).unwrap(),
            "casino.slot.line243.BuBuGaoSheng"
        );
        assert!(matches!(
            f.service_for(5999, Function::BeginGame),
            Err(CallError::UnknownService { category: 5999 })
        ));
    }

    #[test]
    fn test_url_keeps_base_path_and_trims_trailing_slash() {
        let params = [Param::from(7u32), Param::from(2u16), Param::from(0u64)];
        assert_eq!(
            url("http://backend/", 5156, Function::MachineLeave, &params),
            "http://backend/amfphp/json.php/casino.slot.crash.ZumaEmpire.machineLeave/7/2/0"
        );
        assert_eq!(
            url("http://backend/bridge/", 5156, Function::MachineLeave, &params),
            "http://backend/bridge/amfphp/json.php/casino.slot.crash.ZumaEmpire.machineLeave/7/2/0"
        );
    }

    #[test]
    fn test_params_cannot_escape_their_segment() {
        assert_eq!(
            url(
                "http://backend",
                5145,
                Function::LoginCheck,
                &[Param::from("x/../../Admin.deleteAll/1")],
            ),
            "http://backend/amfphp/json.php/Client.loginCheck/x%2F..%2F..%2FAdmin.deleteAll%2F1"
        );
        assert_eq!(
            url(
                "http://backend",
                5145,
                Function::LoginCheck,
                &[Param::from("abc?debug=1#frag")],
            ),
            "http://backend/amfphp/json.php/Client.loginCheck/abc%3Fdebug=1%23frag"
        );
        assert_eq!(
            url("http://backend", 5145, Function::LoginCheck, &[Param::from("100%")]),
            "http://backend/amfphp/json.php/Client.loginCheck/100%25"
        );
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        let f = adapter("http://backend");
        for bad in [".", ".."] {
            assert!(matches!(
                f.url_for(5145, Function::BeginGame, &[Param::from("t"), Param::from(bad)]),
                Err(CallError::InvalidParam(ref s)) if s == bad
            ));
        }
    }

    #[test]
    fn test_invalid_base_url_is_an_error() {
        for base in ["", "not a url", "backend:8080", "mailto:ops@example.com"] {
            assert!(
                matches!(
                    Flash2db::new(base, ServiceMap::default(), None),
                    Err(CallError::InvalidBaseUrl(_))
                ),
                "{base}"
            );
        }
    }

    #[test]
    fn test_service_map_parse() {
        let map = ServiceMap::parse("5145=a.b.C, 5188 = d.e.F,").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(5145), Some("a.b.C"));
        assert_eq!(map.get(5188), Some("d.e.F"));
        assert_eq!(map.get(5156), None);
    }

    #[test]
    fn test_service_map_parse_errors() {
        assert!(ServiceMap::parse("5145").is_err());
        assert!(ServiceMap::parse("abc=x").is_err());
        assert!(ServiceMap::parse("5145=").is_err());
        assert!(ServiceMap::parse("").unwrap().is_empty());
    }
}
