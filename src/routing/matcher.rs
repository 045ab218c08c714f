//! Route matching logic.
//!
//! # Responsibilities
//! - Walk the route table in registration order
//! - Match template segments against path components in lockstep
//! - Extract parameter values in declaration order
//!
//! # Design Decisions
//! - First match wins; there is no specificity ranking, so a catch-all
//!   registered early shadows later routes
//! - No backtracking: each route is tried once, left to right
//! - A wildcard, or a parameter whose constraint accepts `/`, absorbs the
//!   rest of the path and ends the walk
//! - Read-only over the table: safe for any number of concurrent callers

use crate::routing::pattern::Segment;
use crate::routing::router::{parse_method, Route, RouteTable};

/// Captured parameters, in the order the template declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_string(), value.into()));
    }

    /// Value captured for `name`. Absent optional parameters have no entry.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Positional view of the captured values.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn into_values(self) -> Vec<String> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The route that won and the values it captured.
#[derive(Debug)]
pub struct MatchResult<'a, H> {
    pub route: &'a Route<H>,
    pub params: Params,
}

impl<H> RouteTable<H> {
    /// Find the first route matching `path` and `method`.
    ///
    /// `method` is compared case-insensitively. The query string, if any,
    /// must already be stripped from `path`.
    pub fn resolve(&self, path: &str, method: &str) -> Option<MatchResult<'_, H>> {
        let method = parse_method(method);
        let components = split_path(path);

        self.routes()
            .iter()
            .filter(|route| route.method().accepts(method.as_ref()))
            .find_map(|route| {
                match_route(route, &components).map(|params| MatchResult { route, params })
            })
    }
}

/// Split a request path into components. The empty path and `/` both yield
/// a single empty root component.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}

/// Match one route against the path components.
fn match_route<H>(route: &Route<H>, components: &[&str]) -> Option<Params> {
    let mut params = Params::new();
    let mut index = 0;

    for segment in route.pattern().segments() {
        let component = components.get(index).copied();

        match segment {
            Segment::Literal(text) => {
                if component != Some(text.as_str()) {
                    return None;
                }
                index += 1;
            }
            Segment::Wildcard { prefix, name: None } => {
                let accepted = prefix.is_empty()
                    || component.is_some_and(|c| c.starts_with(prefix.as_str()));
                return accepted.then_some(params);
            }
            Segment::Wildcard { prefix, name: Some(name) } => {
                let first = component?.strip_prefix(prefix.as_str())?;
                let value = join_rest(first, &components[index + 1..]);
                if let Some(constraint) = route.constraint(name) {
                    if !constraint.is_match(&value) {
                        return None;
                    }
                }
                params.push(name, value);
                return Some(params);
            }
            Segment::Param { prefix, name, optional } => {
                let Some(component) = component else {
                    if *optional {
                        continue;
                    }
                    return None;
                };
                let value = component.strip_prefix(prefix.as_str())?;

                if let Some(constraint) = route.constraint(name) {
                    if !constraint.is_match(value) {
                        return None;
                    }
                    if constraint.absorbs_separator() {
                        params.push(name, join_rest(value, &components[index + 1..]));
                        return Some(params);
                    }
                }

                params.push(name, value);
                index += 1;
            }
        }
    }

    // Leftover components mean the template was too short.
    (index >= components.len()).then_some(params)
}

fn join_rest(first: &str, rest: &[&str]) -> String {
    let mut value = String::from(first);
    for component in rest {
        value.push('/');
        value.push_str(component);
    }
    value
}
