//! Application builder
//!
//! `HttpServer` collects routes, preprocessors, the middleware and the
//! not-found handler. Binding consumes it, so the route table cannot change
//! once serving starts.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::context::{Reply, Request};
use crate::error::{Error, Result};
use crate::handler::dispatch::SessionSettings;
use crate::handler::{
    BoxHandler, DiskFiles, Dispatcher, FileSource, Handler, HandlerFuture, Middleware,
    Preprocessor, StaticAssets,
};
use crate::logger;
use crate::routing::{Method, RouteTable};
use crate::server::{create_reusable_listener, CloseHandle, ConnectionOptions, Server};

pub struct HttpServer {
    routes: RouteTable<BoxHandler>,
    preprocessors: Vec<Preprocessor>,
    middleware: Option<Box<dyn Middleware>>,
    not_found: Option<BoxHandler>,
    file_source: Arc<dyn FileSource>,
    close: CloseHandle,
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpServer {
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            preprocessors: Vec::new(),
            middleware: None,
            not_found: None,
            file_source: Arc::new(DiskFiles::default()),
            close: CloseHandle::new(),
        }
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    pub fn push<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.route(Method::Push, path, handler)
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.route(Method::Delete, path, handler)
    }

    pub fn add<F>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.route(method, path, handler)
    }

    /// Register any `Handler`; a duplicate `METHOD@path` is logged and ignored
    pub fn route(&mut self, method: Method, path: &str, handler: impl Handler) -> &mut Self {
        match self.routes.register(method, path, Box::new(handler)) {
            Ok(route) => logger::log_route_added(&route.name),
            Err(Error::DuplicateRoute(name)) => logger::log_duplicate_route(&name),
            Err(e) => logger::log_error(&e.to_string()),
        }
        self
    }

    /// Append a preprocessor; they run in registration order
    pub fn preprocessor<F>(&mut self, preprocessor: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Reply) + Send + Sync + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the middleware; a later call replaces the earlier one
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        if self.middleware.replace(Box::new(middleware)).is_some() {
            logger::log_middleware_replaced();
        }
        self
    }

    /// Set the not-found handler
    pub fn error<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.not_found = Some(Box::new(handler));
        self
    }

    /// Replace the file source used for static assets (disk by default)
    pub fn file_source(&mut self, source: impl FileSource) -> &mut Self {
        self.file_source = Arc::new(source);
        self
    }

    /// Handle that stops the server once it is serving
    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    /// Seal the registrations into a dispatcher.
    ///
    /// Fails when the session secret has an invalid length.
    pub fn into_dispatcher(self, config: &Config) -> Result<Dispatcher> {
        let session = config.session_key()?.map(|key| SessionSettings {
            key,
            expire: config.server.session_expire,
        });

        let assets = config
            .server
            .static_mapping()
            .map(|(prefix, dir)| StaticAssets::new(prefix, dir, Arc::clone(&self.file_source)));

        Ok(Dispatcher {
            routes: self.routes,
            preprocessors: self.preprocessors,
            middleware: self.middleware,
            not_found: self.not_found,
            assets,
            session,
            blocked: config.dispatch.clone(),
            handler_timeout: config.performance.handler_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Validate the configuration and bind the listener without serving yet
    pub fn bind(self, config: &Config) -> Result<Server> {
        let addr = config.get_socket_addr()?;
        let close = self.close.clone();
        let dispatcher = self.into_dispatcher(config)?;

        let listener = create_reusable_listener(addr)?;
        let server = Server::new(
            listener,
            dispatcher,
            ConnectionOptions::from(&config.performance),
            close,
        )?;
        logger::log_server_start(&server.local_addr(), config);
        Ok(server)
    }

    /// Bind and serve until closed
    pub async fn listen(self, config: &Config) -> Result<()> {
        self.bind(config)?.serve().await;
        Ok(())
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("routes", &self.routes.len())
            .field("preprocessors", &self.preprocessors.len())
            .field("middleware", &self.middleware.is_some())
            .field("not_found", &self.not_found.is_some())
            .finish_non_exhaustive()
    }
}
