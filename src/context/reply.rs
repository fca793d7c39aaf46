use chrono::{DateTime, Utc};
use cookie::time::{Duration as CookieDuration, OffsetDateTime};
use cookie::Cookie;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use serde::Serialize;

pub use cookie::SameSite;

use crate::logger;

/// Attributes for a `Set-Cookie` directive
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    pub expires: Option<DateTime<Utc>>,
    /// Seconds
    pub max_age: Option<i64>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

/// Mutable response builder; every setter returns `&mut Self` for chaining
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    cookies: Vec<Cookie<'static>>,
}

impl Default for Reply {
    fn default() -> Self {
        Self::new()
    }
}

impl Reply {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            cookies: Vec::new(),
        }
    }

    pub fn status(&mut self, code: u16) -> &mut Self {
        match StatusCode::from_u16(code) {
            Ok(status) => self.status = status,
            Err(e) => logger::log_warning(&format!("Ignoring invalid status code {code}: {e}")),
        }
        self
    }

    /// Set a header, replacing any previous value under that name
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => logger::log_warning(&format!("Ignoring invalid header '{name}: {value}'")),
        }
        self
    }

    /// Shorthand for the `Content-Type` header
    pub fn content_type(&mut self, mime: &str) -> &mut Self {
        self.header(CONTENT_TYPE.as_str(), mime)
    }

    /// Set a cookie with default attributes; an empty value deletes it
    pub fn cookie(&mut self, name: &str, value: &str) -> &mut Self {
        self.cookie_with(name, value, &CookieOptions::default())
    }

    /// Set a cookie; an empty value emits a deletion for name + path + domain
    pub fn cookie_with(&mut self, name: &str, value: &str, options: &CookieOptions) -> &mut Self {
        let cookie = if value.is_empty() {
            removal_cookie(name, options)
        } else {
            build_cookie(name, value, options)
        };
        // One directive per name/path/domain, the latest wins
        self.cookies.retain(|c| {
            !(c.name() == cookie.name() && c.path() == cookie.path() && c.domain() == cookie.domain())
        });
        self.cookies.push(cookie);
        self
    }

    /// Serialize `value` as pretty JSON into the body
    pub fn json<T: Serialize>(&mut self, value: &T) -> &mut Self {
        match serde_json::to_string_pretty(value) {
            Ok(json) => {
                self.content_type("application/json");
                self.body = Bytes::from(json);
            }
            Err(e) => logger::log_error(&format!("Failed to serialize JSON reply: {e}")),
        }
        self
    }

    pub fn html(&mut self, html: impl Into<String>) -> &mut Self {
        self.content_type("text/html");
        self.body = Bytes::from(html.into());
        self
    }

    /// Replace the body without touching headers
    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Vec<Cookie<'static>>, Bytes) {
        (self.status, self.headers, self.cookies, self.body)
    }
}

fn build_cookie(name: &str, value: &str, options: &CookieOptions) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .secure(options.secure)
        .http_only(options.http_only);

    if let Some(expires) = options.expires {
        match OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
            Ok(at) => builder = builder.expires(at),
            Err(e) => logger::log_warning(&format!("Ignoring cookie expiry for '{name}': {e}")),
        }
    }
    if let Some(secs) = options.max_age {
        builder = builder.max_age(CookieDuration::seconds(secs));
    }
    if let Some(domain) = &options.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(path) = &options.path {
        builder = builder.path(path.clone());
    }
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(same_site);
    }

    builder.build()
}

fn removal_cookie(name: &str, options: &CookieOptions) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), String::new()));
    if let Some(domain) = &options.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(path) = &options.path {
        builder = builder.path(path.clone());
    }
    let mut cookie = builder.build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_chaining() {
        let mut reply = Reply::new();
        reply
            .status(418)
            .header("working", "true")
            .content_type("application/json")
            .cookie("working", "true");

        assert_eq!(reply.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(reply.header_value("working"), Some("true"));
        assert_eq!(reply.header_value("content-type"), Some("application/json"));
        assert_eq!(reply.cookies().len(), 1);
        assert_eq!(reply.cookies()[0].to_string(), "working=true");
    }

    #[test]
    fn test_header_overwrites() {
        let mut reply = Reply::new();
        reply.header("X-Pre", "1").header("x-pre", "2");
        assert_eq!(reply.headers().get_all("x-pre").iter().count(), 1);
        assert_eq!(reply.header_value("X-Pre"), Some("2"));

        reply.header("bad header", "x").status(1000);
        assert_eq!(reply.headers().len(), 1);
        assert_eq!(reply.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_json_then_html_last_wins() {
        let mut reply = Reply::new();
        reply.json(&serde_json::json!({"code": 200}));
        assert_eq!(reply.body(), &Bytes::from("{\n  \"code\": 200\n}"));
        assert_eq!(reply.header_value("content-type"), Some("application/json"));

        reply.html("<h1>Hello</h1>");
        assert_eq!(reply.body(), &Bytes::from("<h1>Hello</h1>"));
        assert_eq!(reply.header_value("content-type"), Some("text/html"));
    }

    #[test]
    fn test_cookie_attributes() {
        let mut reply = Reply::new();
        let options = CookieOptions {
            expires: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).single(),
            max_age: Some(60),
            domain: Some("example.com".to_string()),
            path: Some("/".to_string()),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Strict),
        };
        reply.cookie_with("token", "abc", &options);

        let header = reply.cookies()[0].to_string();
        assert!(header.starts_with("token=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Secure"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Domain=example.com"));
        assert!(header.contains("Max-Age=60"));
        assert!(header.contains("Expires=Tue, 01 Jan 2030 00:00:00 GMT"));
    }

    #[test]
    fn test_empty_value_deletes_cookie() {
        let mut reply = Reply::new();
        reply.cookie("session", "abc");
        reply.cookie_with(
            "session",
            "",
            &CookieOptions {
                path: Some("/".to_string()),
                ..CookieOptions::default()
            },
        );
        reply.cookie("session", "");

        // The default-path directive was replaced; the Path=/ one stays
        assert_eq!(reply.cookies().len(), 2);
        for cookie in reply.cookies() {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
        }
    }
}
