//! Dispatch pipeline
//!
//! One call per request: blocked-path filter, preprocessors, middleware
//! before-phase, outcome resolution (static asset, exact route,
//! parameterized route, not-found), middleware after-phase, session
//! persistence and finally the response.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use chrono::{TimeDelta, TimeZone, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::Response;

use super::{BoxHandler, Handler, Middleware, MiddlewareResult, Outcome, Preprocessor, StaticAssets};
use crate::config::{DispatchConfig, SessionExpire};
use crate::context::{Body, BoxError, CookieOptions, Reply, Request, SameSite};
use crate::http::{build_reply_response, not_found_body, timeout_body};
use crate::logger;
use crate::routing::RouteTable;
use crate::session::{SessionKey, SESSION_COOKIE};

/// Session cookie settings, present only when a secret is configured
#[derive(Debug)]
pub(crate) struct SessionSettings {
    pub key: SessionKey,
    pub expire: Option<SessionExpire>,
}

/// Immutable, shareable request dispatcher
///
/// Built by `HttpServer::into_dispatcher`; once built the route table can no
/// longer change.
pub struct Dispatcher {
    pub(crate) routes: RouteTable<BoxHandler>,
    pub(crate) preprocessors: Vec<Preprocessor>,
    pub(crate) middleware: Option<Box<dyn Middleware>>,
    pub(crate) not_found: Option<BoxHandler>,
    pub(crate) assets: Option<StaticAssets>,
    pub(crate) session: Option<SessionSettings>,
    pub(crate) blocked: DispatchConfig,
    pub(crate) handler_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Run the whole pipeline for one request
    pub async fn dispatch<B>(&self, req: hyper::Request<B>, remote: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let mut request = Request::new(
            req,
            remote,
            self.assets.as_ref().map(StaticAssets::prefix),
            self.session.as_ref().map(|s| &s.key),
        );
        let mut reply = Reply::new();

        // Blocked paths skip preprocessors, middleware and sessions
        if self.blocked.is_blocked(&request.path) {
            self.not_found(&mut request, &mut reply).await;
            return build_reply_response(reply);
        }

        for preprocessor in &self.preprocessors {
            preprocessor(&mut request, &mut reply);
        }

        let started = Instant::now();
        if let Some(middleware) = &self.middleware {
            middleware.before(&mut request, &mut reply);
        }

        let outcome = self.resolve(&mut request, &mut reply).await;

        if let Some(middleware) = &self.middleware {
            let result = MiddlewareResult {
                process_time: started.elapsed(),
                outcome,
            };
            middleware.after(&request, &reply, &result);
        }

        self.persist_session(&request, &mut reply);
        build_reply_response(reply)
    }

    /// Number of registered routes
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    async fn resolve(&self, req: &mut Request, reply: &mut Reply) -> Outcome {
        if let Some(assets) = self.assets.as_ref().filter(|a| a.matches(&req.path)) {
            return match assets.load(&req.path).await {
                Some((content, content_type)) => {
                    if reply.header_value(CONTENT_TYPE.as_str()).is_none() {
                        reply.content_type(content_type);
                    }
                    reply.set_body(content);
                    Outcome::StaticFile
                }
                None => self.not_found(req, reply).await,
            };
        }

        let Some(found) = self.routes.resolve(req.method.as_str(), &req.path) else {
            return self.not_found(req, reply).await;
        };
        req.path_params = found.params;

        if self.run_handler(found.route.handler.as_ref(), req, reply).await {
            Outcome::Route
        } else {
            Outcome::TimedOut
        }
    }

    /// Custom not-found handler, or the built-in JSON 404
    async fn not_found(&self, req: &mut Request, reply: &mut Reply) -> Outcome {
        reply.status(404).content_type("application/json");

        match &self.not_found {
            Some(handler) => {
                if self.run_handler(handler.as_ref(), req, reply).await {
                    Outcome::NotFound
                } else {
                    Outcome::TimedOut
                }
            }
            None => {
                reply.set_body(not_found_body(&req.path));
                Outcome::NotFound
            }
        }
    }

    /// Invoke a handler and fold its result into the reply.
    ///
    /// Returns `false` when the handler missed its deadline; the reply is then
    /// a 504 with a JSON body.
    async fn run_handler(&self, handler: &dyn Handler, req: &mut Request, reply: &mut Reply) -> bool {
        let body = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, handler.call(req, reply)).await {
                Ok(body) => body,
                Err(_) => {
                    logger::log_warning(&format!(
                        "Handler for {} {} exceeded {}ms",
                        req.method,
                        req.path,
                        limit.as_millis()
                    ));
                    reply
                        .status(504)
                        .content_type("application/json")
                        .set_body(timeout_body(&req.path));
                    return false;
                }
            },
            None => handler.call(req, reply).await,
        };

        apply_body(reply, body);
        true
    }

    fn persist_session(&self, req: &Request, reply: &mut Reply) {
        let Some(settings) = &self.session else {
            return;
        };

        if req.session.is_empty() {
            if req.has_session_cookie() {
                let options = CookieOptions {
                    path: Some("/".to_string()),
                    ..CookieOptions::default()
                };
                reply.cookie_with(SESSION_COOKIE, "", &options);
            }
            return;
        }

        match req.session.to_cookie_value(&settings.key) {
            Ok(value) => {
                reply.cookie_with(SESSION_COOKIE, &value, &session_cookie_options(settings.expire));
            }
            Err(e) => logger::log_error(&format!("Failed to encrypt session: {e}")),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("preprocessors", &self.preprocessors.len())
            .field("middleware", &self.middleware.is_some())
            .field("assets", &self.assets)
            .field("sessions", &self.session.is_some())
            .field("handler_timeout", &self.handler_timeout)
            .finish_non_exhaustive()
    }
}

/// Text as is, JSON pretty-printed, empty keeps the accumulated body
fn apply_body(reply: &mut Reply, body: Body) {
    match body {
        Body::Text(text) => {
            if reply.header_value(CONTENT_TYPE.as_str()).is_none() {
                reply.content_type("text/plain; charset=utf-8");
            }
            reply.set_body(text);
        }
        Body::Json(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                if reply.header_value(CONTENT_TYPE.as_str()).is_none() {
                    reply.content_type("application/json");
                }
                reply.set_body(json);
            }
            Err(e) => logger::log_error(&format!("Failed to serialize handler result: {e}")),
        },
        Body::Empty => {}
    }
}

fn session_cookie_options(expire: Option<SessionExpire>) -> CookieOptions {
    let mut options = CookieOptions {
        path: Some("/".to_string()),
        http_only: true,
        same_site: Some(SameSite::Lax),
        ..CookieOptions::default()
    };

    match expire {
        Some(SessionExpire::After(secs)) => {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            options.max_age = Some(secs);
            options.expires = TimeDelta::try_seconds(secs)
                .and_then(|delta| Utc::now().checked_add_signed(delta));
        }
        Some(SessionExpire::Never) => {
            options.expires = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).single();
        }
        None => {}
    }

    options
}
