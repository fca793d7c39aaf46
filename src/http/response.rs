//! HTTP response building module
//!
//! Turns a finished `Reply` into the hyper response and holds the built-in
//! JSON error bodies.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SET_COOKIE};
use hyper::Response;
use serde_json::json;

use crate::context::Reply;

/// Body of the built-in 404: `{"code":404,"message":"Path <path> not found!"}`
pub fn not_found_body(path: &str) -> String {
    json!({ "code": 404, "message": format!("Path {path} not found!") }).to_string()
}

/// Body sent when a handler exceeds its deadline
pub fn timeout_body(path: &str) -> String {
    json!({ "code": 504, "message": format!("Handler for {path} timed out") }).to_string()
}

/// Build the wire response from a finished reply, one `Set-Cookie` per cookie
pub fn build_reply_response(reply: Reply) -> Response<Full<Bytes>> {
    let (status, headers, cookies, body) = reply.into_parts();

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => crate::logger::log_error(&format!(
                "Dropping unencodable cookie '{}': {e}",
                cookie.name()
            )),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    #[test]
    fn test_error_bodies() {
        assert_eq!(
            not_found_body("/nope"),
            r#"{"code":404,"message":"Path /nope not found!"}"#
        );
        assert_eq!(
            timeout_body("/slow"),
            r#"{"code":504,"message":"Handler for /slow timed out"}"#
        );
    }

    #[tokio::test]
    async fn test_reply_response() {
        let mut reply = Reply::new();
        reply
            .status(201)
            .header("X-Pre", "1")
            .cookie("a", "1")
            .cookie("b", "2")
            .html("<p>ok</p>");

        let response = build_reply_response(reply);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-pre"], "1");
        assert_eq!(response.headers()["content-type"], "text/html");
        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("<p>ok</p>"));
    }
}
