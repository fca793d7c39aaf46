//! Route table
//!
//! Exact lookup by `METHOD@path` first, then a linear scan over the
//! parameterized routes in registration order (first registered wins).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::pattern::RoutePattern;
use crate::error::Error;

/// Methods a route can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Push,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Push => "PUSH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUSH" => Ok(Self::Push),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported route method: {other}")),
        }
    }
}

/// A registered route
#[derive(Debug)]
pub struct Route<H> {
    pub method: Method,
    pub path: String,
    pub name: String,
    pub pattern: RoutePattern,
    pub handler: H,
}

impl<H> Route<H> {
    pub fn new(method: Method, path: &str, handler: H) -> Self {
        Self {
            method,
            path: path.to_string(),
            name: route_name(method.as_str(), path),
            pattern: RoutePattern::compile(path),
            handler,
        }
    }
}

/// Result of resolving a request against the table
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    /// Empty for exact matches
    pub params: HashMap<String, String>,
}

#[derive(Debug)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
    by_name: HashMap<String, usize>,
    parameterized: Vec<usize>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            by_name: HashMap::new(),
            parameterized: Vec::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn contains(&self, method: Method, path: &str) -> bool {
        self.by_name.contains_key(&route_name(method.as_str(), path))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    /// Insert a route; a second registration of the same `METHOD@path` is rejected
    pub fn register(&mut self, method: Method, path: &str, handler: H) -> Result<&Route<H>, Error> {
        let route = Route::new(method, path, handler);
        if self.by_name.contains_key(&route.name) {
            return Err(Error::DuplicateRoute(route.name));
        }

        let idx = self.routes.len();
        if route.pattern.is_parameterized() {
            self.parameterized.push(idx);
        }
        self.by_name.insert(route.name.clone(), idx);
        self.routes.push(route);
        Ok(&self.routes[idx])
    }

    /// Resolve a request method and decoded path to a route
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch<'_, H>> {
        if let Some(&idx) = self.by_name.get(&route_name(method, path)) {
            return Some(RouteMatch {
                route: &self.routes[idx],
                params: HashMap::new(),
            });
        }

        self.parameterized.iter().find_map(|&idx| {
            let route = &self.routes[idx];
            if route.method.as_str() != method {
                return None;
            }
            route
                .pattern
                .extract(path)
                .map(|params| RouteMatch { route, params })
        })
    }
}

fn route_name(method: &str, path: &str) -> String {
    format!("{method}@{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(Method, &str, &'static str)]) -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        for (method, path, handler) in entries {
            table.register(*method, path, *handler).unwrap();
        }
        table
    }

    #[test]
    fn test_exact_lookup() {
        let table = table(&[(Method::Get, "/api/joke", "joke")]);
        let found = table.resolve("GET", "/api/joke").unwrap();
        assert_eq!(found.route.handler, "joke");
        assert_eq!(found.route.name, "GET@/api/joke");
        assert!(found.params.is_empty());

        assert!(table.resolve("POST", "/api/joke").is_none());
        assert!(table.resolve("GET", "/api/joke/").is_none());
    }

    #[test]
    fn test_exact_wins_over_parameterized() {
        let table = table(&[
            (Method::Get, "/api/user/:userId", "param"),
            (Method::Get, "/api/user/me", "exact"),
        ]);
        let found = table.resolve("GET", "/api/user/me").unwrap();
        assert_eq!(found.route.handler, "exact");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_parameterized_match() {
        let table = table(&[(Method::Get, "/api/user/:userId", "user")]);
        let found = table.resolve("GET", "/api/user/42").unwrap();
        assert_eq!(found.route.handler, "user");
        assert_eq!(found.params.get("userId").map(String::as_str), Some("42"));

        assert!(table.resolve("GET", "/api/user/42/extra").is_none());
        assert!(table.resolve("DELETE", "/api/user/42").is_none());
    }

    #[test]
    fn test_parameterized_first_registered_wins() {
        let table = table(&[
            (Method::Get, "/files/:name", "first"),
            (Method::Get, "/:section/report", "second"),
        ]);
        let found = table.resolve("GET", "/files/report").unwrap();
        assert_eq!(found.route.handler, "first");
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut table = table(&[(Method::Get, "/x", "first")]);
        let err = table.register(Method::Get, "/x", "second").unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute(ref name) if name == "GET@/x"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("GET", "/x").unwrap().route.handler, "first");

        // Same path, different method is a different route
        table.register(Method::Post, "/x", "post").unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("PUSH".parse::<Method>(), Ok(Method::Push));
        assert!("PUT".parse::<Method>().is_err());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
