use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use cookie::Cookie;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, CONTENT_TYPE, COOKIE, HOST};
use hyper::{Method, Version};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::session::{Session, SessionKey, SESSION_COOKIE};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased, single-pass request body
pub type BoxBody = UnsyncBoxBody<Bytes, BoxError>;

/// Raw body bytes together with the declared content type
#[derive(Debug, Clone)]
pub struct Blob {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Per-request view handed to preprocessors, middleware and handlers
pub struct Request {
    /// Absolute URL when the host is known, otherwise the request target
    pub url: String,
    /// Percent-decoded path
    pub path: String,
    pub method: Method,
    pub version: Version,
    pub headers: HeaderMap,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub query_params: HashMap<String, String>,
    /// Filled in after a parameterized route matched
    pub path_params: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub session: Session,
    pub remote_addr: IpAddr,
    /// Path falls under the static asset prefix
    pub resource_request: bool,
    body: Option<BoxBody>,
}

impl Request {
    /// Build the request view from an already parsed HTTP request
    pub fn new<B>(
        req: hyper::Request<B>,
        remote: Option<SocketAddr>,
        static_prefix: Option<&str>,
        session_key: Option<&SessionKey>,
    ) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let uri = &parts.uri;

        let raw_path = uri.path();
        // An undecodable path is kept as received
        let path = urlencoding::decode(raw_path)
            .map_or_else(|_| raw_path.to_string(), |p| p.into_owned());

        let query = uri.query().map(ToString::to_string);
        let query_params = query.as_deref().map(parse_pairs).unwrap_or_default();

        let url = match (uri.authority(), parts.headers.get(HOST).and_then(|h| h.to_str().ok())) {
            (Some(_), _) => uri.to_string(),
            (None, Some(host)) => format!("http://{host}{uri}"),
            (None, None) => uri.to_string(),
        };

        let cookies = parse_cookies(&parts.headers);
        let session = Session::from_cookie(
            cookies.get(SESSION_COOKIE).map(String::as_str),
            session_key,
        );

        let resource_request = static_prefix.is_some_and(|prefix| under_prefix(&path, prefix));

        let body: BoxBody = body
            .map_err(|e| -> BoxError { e.into() })
            .boxed_unsync();

        Self {
            url,
            path,
            method: parts.method,
            version: parts.version,
            headers: parts.headers,
            query,
            query_params,
            path_params: HashMap::new(),
            cookies,
            session,
            remote_addr: remote.map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |addr| addr.ip()),
            resource_request,
            body: Some(body),
        }
    }

    /// Header value by name; names are matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Whether the request carried a `session` cookie, valid or not
    pub fn has_session_cookie(&self) -> bool {
        self.cookies.contains_key(SESSION_COOKIE)
    }

    /// Read the whole body. Fails with `BodyConsumed` on a second read.
    pub async fn array_buffer(&mut self) -> Result<Bytes> {
        let body = self.body.take().ok_or(Error::BodyConsumed)?;
        let collected = body
            .collect()
            .await
            .map_err(|e| Error::Body(e.to_string()))?;
        Ok(collected.to_bytes())
    }

    pub async fn blob(&mut self) -> Result<Blob> {
        let data = self.array_buffer().await?;
        Ok(Blob {
            data,
            content_type: self.header(CONTENT_TYPE.as_str()).map(ToString::to_string),
        })
    }

    pub async fn text(&mut self) -> Result<String> {
        let data = self.array_buffer().await?;
        String::from_utf8(data.to_vec()).map_err(|e| Error::Body(e.to_string()))
    }

    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let data = self.array_buffer().await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// `application/x-www-form-urlencoded` body; duplicate keys, last wins
    pub async fn form_data(&mut self) -> Result<HashMap<String, String>> {
        let data = self.array_buffer().await?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&data)?;
        Ok(pairs.into_iter().collect())
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_params", &self.query_params)
            .field("path_params", &self.path_params)
            .field("remote_addr", &self.remote_addr)
            .field("resource_request", &self.resource_request)
            .finish_non_exhaustive()
    }
}

/// Whether `path` lies under the URL prefix (segment aligned)
pub(crate) fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn parse_pairs(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde::Deserialize;

    fn build(uri: &str, headers: &[(&str, &str)], body: &'static str) -> Request {
        let mut builder = hyper::Request::builder().method("POST").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap();
        Request::new(req, None, Some("/assets"), None)
    }

    #[test]
    fn test_path_and_query() {
        let req = build("/api/hello%20world?a=1&b=two&a=3", &[("Host", "example.com")], "");
        assert_eq!(req.path, "/api/hello world");
        assert_eq!(req.query_param("a"), Some("3"));
        assert_eq!(req.query_param("b"), Some("two"));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(req.url, "http://example.com/api/hello%20world?a=1&b=two&a=3");
        assert_eq!(req.remote_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!req.resource_request);
    }

    #[test]
    fn test_headers_and_cookies() {
        let req = build(
            "/assets/app.css",
            &[("X-Trace", "abc"), ("Cookie", "working=true; theme=dark")],
            "",
        );
        assert_eq!(req.header("x-trace"), Some("abc"));
        assert_eq!(req.header("X-Trace"), Some("abc"));
        assert_eq!(req.cookie("working"), Some("true"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert!(!req.has_session_cookie());
        assert!(req.resource_request);
    }

    #[test]
    fn test_under_prefix() {
        assert!(under_prefix("/assets/style.css", "/assets"));
        assert!(under_prefix("/assets", "/assets/"));
        assert!(!under_prefix("/assetsfoo", "/assets"));
        assert!(!under_prefix("/api", "/assets"));
    }

    #[tokio::test]
    async fn test_json_body_consumed_once() {
        #[derive(Deserialize)]
        struct Payload {
            name: String,
        }

        let mut req = build("/", &[], r#"{"name":"alice"}"#);
        let payload: Payload = req.json().await.unwrap();
        assert_eq!(payload.name, "alice");
        assert!(matches!(req.text().await, Err(Error::BodyConsumed)));
    }

    #[tokio::test]
    async fn test_form_and_blob() {
        let mut req = build("/", &[], "user=bob&lang=rust&lang=go");
        let form = req.form_data().await.unwrap();
        assert_eq!(form.get("user").map(String::as_str), Some("bob"));
        assert_eq!(form.get("lang").map(String::as_str), Some("go"));

        let mut req = build("/", &[("Content-Type", "text/plain")], "raw");
        let blob = req.blob().await.unwrap();
        assert_eq!(blob.data, Bytes::from_static(b"raw"));
        assert_eq!(blob.content_type.as_deref(), Some("text/plain"));
        assert!(matches!(req.array_buffer().await, Err(Error::BodyConsumed)));
    }
}
