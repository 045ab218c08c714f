//! Route table and registration.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Hand out a `RouteHandle` so constraints can be attached after registration
//!
//! # Design Decisions
//! - Append-only: routes are never removed or reordered
//! - No deduplication: overlapping templates are resolved by order alone
//! - Method comparison is case-insensitive; `*` registers an any-method route

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::routing::matcher::Params;
use crate::routing::pattern::{Constraint, Pattern, PatternError, Segment};

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Only(Method),
    Any,
}

impl MethodFilter {
    /// Returns true if a request with `method` may use this route.
    /// Requests with an unrecognized method only reach `Any` routes.
    pub fn accepts(&self, method: Option<&Method>) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(expected) => method == Some(expected),
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(method)
    }
}

impl FromStr for MethodFilter {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(MethodFilter::Any);
        }
        parse_method(s)
            .map(MethodFilter::Only)
            .ok_or_else(|| PatternError::InvalidMethod(s.to_string()))
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Only(method) => write!(f, "{method}"),
            MethodFilter::Any => write!(f, "*"),
        }
    }
}

/// Normalize a method name (`get`, `Get`, `GET`) into a `Method`.
pub(crate) fn parse_method(method: &str) -> Option<Method> {
    if method.is_empty() {
        return None;
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).ok()
}

/// One registered endpoint.
pub struct Route<H> {
    method: MethodFilter,
    pattern: Pattern,
    handler: H,
    constraints: HashMap<String, Constraint>,
}

impl<H> Route<H> {
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Constraint attached to parameter `name`, inline or external.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    /// Build a path from parameter values (reverse routing).
    ///
    /// Rendering stops at an absent optional parameter and after a
    /// parameter whose constraint absorbs the rest of the path. Constraints
    /// are not checked here.
    pub fn render(&self, params: &Params) -> Result<String, PatternError> {
        let mut parts = Vec::with_capacity(self.pattern.segments().len());

        for segment in self.pattern.segments() {
            match segment {
                Segment::Literal(text) => parts.push(text.clone()),
                Segment::Param { prefix, name, optional } => {
                    match params.get(name) {
                        Some(value) => parts.push(format!("{prefix}{value}")),
                        None if *optional => break,
                        None => return Err(PatternError::MissingParam(name.clone())),
                    }
                    if self.constraint(name).is_some_and(Constraint::absorbs_separator) {
                        break;
                    }
                }
                Segment::Wildcard { prefix, name: Some(name) } => match params.get(name) {
                    Some(value) => parts.push(format!("{prefix}{value}")),
                    None => return Err(PatternError::MissingParam(name.clone())),
                },
                Segment::Wildcard { name: None, .. } => {
                    return Err(PatternError::AnonymousWildcard);
                }
            }
        }

        Ok(format!("/{}", parts.join("/")))
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .field("constraints", &self.constraints.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Returned by registration; scopes constraint changes to one route.
pub struct RouteHandle<'a, H> {
    route: &'a mut Route<H>,
}

impl<'a, H> RouteHandle<'a, H> {
    /// Attach or overwrite the constraint for parameter `name`.
    pub fn constrain(self, name: &str, regex: &str) -> Result<Self, PatternError> {
        let constraint = Constraint::new(name, regex)?;
        self.route.constraints.insert(name.to_string(), constraint);
        Ok(self)
    }

    pub fn route(&self) -> &Route<H> {
        self.route
    }
}

/// Ordered collection of routes, consulted first to last.
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Compile `template` and append a route for it.
    pub fn register(
        &mut self,
        method: impl Into<MethodFilter>,
        template: &str,
        handler: H,
    ) -> Result<RouteHandle<'_, H>, PatternError> {
        let pattern = Pattern::compile(template)?;
        let constraints = pattern
            .inline_constraints()
            .map(|(name, c)| (name.to_string(), c.clone()))
            .collect();
        let method = method.into();

        tracing::debug!(method = %method, template = %template, "Route registered");

        let index = self.routes.len();
        self.routes.push(Route {
            method,
            pattern,
            handler,
            constraints,
        });
        Ok(RouteHandle {
            route: &mut self.routes[index],
        })
    }

    /// Register using a textual method name; `*` matches every method.
    pub fn register_str(
        &mut self,
        method: &str,
        template: &str,
        handler: H,
    ) -> Result<RouteHandle<'_, H>, PatternError> {
        let method: MethodFilter = method.parse()?;
        self.register(method, template, handler)
    }

    pub fn get(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(Method::GET, template, handler)
    }

    pub fn post(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(Method::POST, template, handler)
    }

    pub fn put(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(Method::PUT, template, handler)
    }

    pub fn delete(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(Method::DELETE, template, handler)
    }

    pub fn patch(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(Method::PATCH, template, handler)
    }

    pub fn options(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(Method::OPTIONS, template, handler)
    }

    /// Register a route for every method.
    pub fn any(&mut self, template: &str, handler: H) -> Result<RouteHandle<'_, H>, PatternError> {
        self.register(MethodFilter::Any, template, handler)
    }

    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for RouteTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}
