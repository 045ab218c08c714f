//! Route template parsing.
//!
//! # Template Syntax
//! ```text
//! /api/instances              literal segments
//! /api/instance/{id}          required parameter
//! /search/{query?}            optional parameter (last segment only)
//! /api/instance/{id<\d+>}     parameter with an inline constraint
//! /v{version}                 parameter behind a literal prefix
//! /files/{path*}              named wildcard, captures the rest of the path
//! /static/assets*             anonymous wildcard with a literal prefix
//! ```
//!
//! # Design Decisions
//! - Templates are compiled once at registration; matching never re-parses
//! - Constraints are anchored (`^(?:re)$`) and compiled when installed
//! - Whether a constraint also matches `/` is computed once, at install time

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;


/// Errors raised while compiling a template or installing a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unbalanced braces in segment `{0}`")]
    UnbalancedBraces(String),

    #[error("unbalanced angle brackets in segment `{0}`")]
    UnbalancedAngles(String),

    #[error("invalid parameter name in segment `{0}`")]
    InvalidName(String),

    #[error("unexpected text after the parameter in segment `{0}`")]
    TrailingText(String),

    #[error("invalid constraint for `{name}`: {message}")]
    InvalidConstraint { name: String, message: String },

    #[error("optional parameter `{0}` must be the last segment")]
    OptionalNotLast(String),

    #[error("wildcard `{0}` must be the last segment")]
    WildcardNotLast(String),

    #[error("parameter `{0}` declared twice")]
    DuplicateParam(String),

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("missing value for parameter `{0}`")]
    MissingParam(String),

    #[error("an anonymous wildcard cannot be rendered")]
    AnonymousWildcard,
}

/// One `/`-delimited unit of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path component exactly.
    Literal(String),
    /// Captures a path component, minus `prefix`.
    Param {
        prefix: String,
        name: String,
        optional: bool,
    },
    /// Absorbs every remaining component. Named wildcards capture them.
    Wildcard {
        prefix: String,
        name: Option<String>,
    },
}

impl Segment {
    /// Name of the captured parameter, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param { name, .. } => Some(name),
            Segment::Wildcard { name, .. } => name.as_deref(),
        }
    }
}

/// A regular expression a captured value must satisfy.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
    absorbs_separator: bool,
}

impl Constraint {
    /// Compile `source` as an anchored constraint for parameter `name`.
    pub fn new(name: &str, source: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            PatternError::InvalidConstraint {
                name: name.to_string(),
                message: e.to_string(),
            }
        })?;
        let absorbs_separator = regex.is_match("/");

        Ok(Self {
            source: source.to_string(),
            regex,
            absorbs_separator,
        })
    }

    /// The constraint as written at registration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// True when the constraint accepts the path separator itself, which
    /// turns the parameter into an absorb-the-rest capture.
    pub fn absorbs_separator(&self) -> bool {
        self.absorbs_separator
    }
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
    inline: Vec<(String, Constraint)>,
}

impl Pattern {
    /// Compile a route template.
    ///
    /// Leading and trailing slashes are ignored, so `/` compiles to a single
    /// empty literal segment that matches the root path.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let raw_segments = split_template(template);
        let last = raw_segments.len() - 1;

        let mut segments = Vec::with_capacity(raw_segments.len());
        let mut inline = Vec::new();
        let mut names = HashSet::new();

        for (index, raw) in raw_segments.iter().enumerate() {
            let (segment, constraint) = parse_segment(raw)?;

            match &segment {
                Segment::Param { name, optional: true, .. } if index != last => {
                    return Err(PatternError::OptionalNotLast(name.clone()));
                }
                Segment::Wildcard { .. } if index != last => {
                    return Err(PatternError::WildcardNotLast(raw.to_string()));
                }
                _ => {}
            }

            if let Some(name) = segment.param_name() {
                if !names.insert(name.to_string()) {
                    return Err(PatternError::DuplicateParam(name.to_string()));
                }
            }

            if let Some(source) = constraint {
                let name = segment.param_name().unwrap_or_default().to_string();
                let constraint = Constraint::new(&name, source)?;
                inline.push((name, constraint));
            }

            segments.push(segment);
        }

        Ok(Self {
            template: template.to_string(),
            segments,
            inline,
        })
    }

    /// The template exactly as registered.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Constraints declared inline with `{name<regex>}`.
    pub fn inline_constraints(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.inline.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }
}

/// Split a template on `/`, except inside `{...}` where a separator belongs
/// to the parameter's inline constraint.
fn split_template(template: &str) -> Vec<&str> {
    let trimmed = template.trim_matches('/');
    let mut parts = Vec::new();
    let mut braces = 0usize;
    let mut angles = 0usize;
    let mut start = 0;

    for (index, ch) in trimmed.char_indices() {
        match ch {
            '{' => braces += 1,
            '}' => {
                braces = braces.saturating_sub(1);
                if braces == 0 {
                    angles = 0;
                }
            }
            '<' if braces > 0 => angles += 1,
            '>' if braces > 0 => angles = angles.saturating_sub(1),
            '/' if braces == 0 && angles == 0 => {
                parts.push(&trimmed[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&trimmed[start..]);
    parts
}

/// Parse one raw segment into a descriptor plus its inline constraint source.
fn parse_segment(raw: &str) -> Result<(Segment, Option<&str>), PatternError> {
    let Some(open) = raw.find('{') else {
        if raw.contains('}') {
            return Err(PatternError::UnbalancedBraces(raw.to_string()));
        }
        if let Some(prefix) = raw.strip_suffix('*') {
            let segment = Segment::Wildcard {
                prefix: prefix.to_string(),
                name: None,
            };
            return Ok((segment, None));
        }
        return Ok((Segment::Literal(raw.to_string()), None));
    };

    let prefix = &raw[..open];
    if prefix.contains('}') {
        return Err(PatternError::UnbalancedBraces(raw.to_string()));
    }

    let close = closing_brace(raw, open)
        .ok_or_else(|| PatternError::UnbalancedBraces(raw.to_string()))?;
    if close != raw.len() - 1 {
        return Err(PatternError::TrailingText(raw.to_string()));
    }

    let mut expr = &raw[open + 1..close];
    let mut optional = false;
    let mut wildcard = false;
    if let Some(rest) = expr.strip_suffix('?') {
        optional = true;
        expr = rest;
    } else if let Some(rest) = expr.strip_suffix('*') {
        wildcard = true;
        expr = rest;
    }

    let (name, constraint) = match expr.find('<') {
        Some(lt) => {
            let body = expr[lt + 1..]
                .strip_suffix('>')
                .ok_or_else(|| PatternError::UnbalancedAngles(raw.to_string()))?;
            (&expr[..lt], Some(body))
        }
        None if expr.contains('>') => {
            return Err(PatternError::UnbalancedAngles(raw.to_string()));
        }
        None => (expr, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(PatternError::InvalidName(raw.to_string()));
    }

    let segment = if wildcard {
        Segment::Wildcard {
            prefix: prefix.to_string(),
            name: Some(name.to_string()),
        }
    } else {
        Segment::Param {
            prefix: prefix.to_string(),
            name: name.to_string(),
            optional,
        }
    };

    Ok((segment, constraint))
}

/// Index of the `}` closing the `{` at `open`, honoring nested braces such
/// as regex repetition counts.
fn closing_brace(raw: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, ch) in raw.char_indices().skip_while(|(i, _)| *i < open) {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
