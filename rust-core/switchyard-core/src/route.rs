//! # Route Metadata
//!
//! A template such as `/notes/:id` is split on `/` into segments; empty
//! segments are dropped, and a segment starting with `:` is a variable bound
//! by position.

use crate::request::RequestKind;
use crate::value_map::ValueMap;
use std::fmt;

/// Prefix marking a variable segment in a template
pub const VARIABLE_MARKER: char = ':';

/// One segment of a route template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the inbound segment
    Literal(String),
    /// Matches any inbound segment, exposed under this name
    Variable(String),
}

impl Segment {
    fn parse(part: &str) -> Self {
        part.strip_prefix(VARIABLE_MARKER).map_or_else(
            || Self::Literal(part.to_string()),
            |name| Self::Variable(name.to_string()),
        )
    }

    /// True for literal segments
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Variable(name) => write!(f, "{VARIABLE_MARKER}{name}"),
        }
    }
}

/// Split an inbound path into its non-empty segments
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Route metadata: kind, template and visibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Operation kind the route answers
    pub kind: RequestKind,
    /// Template as registered (e.g. "/notes/:id")
    pub template: String,
    /// Whether the route is reachable without a bearer token
    pub is_public: bool,
    /// Parsed template segments
    pub segments: Vec<Segment>,
}

impl RouteInfo {
    /// Parse a template into route metadata
    #[must_use]
    pub fn new(kind: RequestKind, template: &str, is_public: bool) -> Self {
        Self {
            kind,
            template: template.to_string(),
            is_public,
            segments: split_path(template).into_iter().map(Segment::parse).collect(),
        }
    }

    /// Whether both routes answer exactly the same set of paths
    ///
    /// Same kind, same segment count, and at every position either both
    /// segments are variables or both are equal literals. Variable names
    /// are ignored.
    #[must_use]
    pub fn collides_with(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Variable(_), Segment::Variable(_)) => true,
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => false,
                })
    }

    /// Whether the route matches already-split path segments
    #[must_use]
    pub fn matches(&self, parts: &[&str]) -> bool {
        self.segments.len() == parts.len()
            && self
                .segments
                .iter()
                .zip(parts)
                .all(|(segment, part)| match segment {
                    Segment::Literal(text) => text == part,
                    Segment::Variable(_) => true,
                })
    }

    /// Literal/variable layout, compared lexicographically to rank routes
    ///
    /// A literal outranks a variable at the first position where two
    /// routes differ.
    #[must_use]
    pub fn specificity(&self) -> Vec<bool> {
        self.segments.iter().map(Segment::is_literal).collect()
    }

    /// Bind each variable name to the inbound segment at its position
    ///
    /// Positions missing from `path` are skipped.
    #[must_use]
    pub fn extract_route_data(&self, path: &str) -> ValueMap {
        let parts = split_path(path);
        let mut data = ValueMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            if let Segment::Variable(name) = segment {
                data.set(name.as_str(), part);
            }
        }
        data
    }
}

impl fmt::Display for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/", self.kind)?;
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_info_simple() {
        let info = RouteInfo::new(RequestKind::Pull, "/notes", true);
        assert_eq!(info.segments, vec![Segment::Literal("notes".to_string())]);
        assert!(info.is_public);
    }

    #[test]
    fn test_route_info_with_variable() {
        let info = RouteInfo::new(RequestKind::Pull, "/notes/:id", false);
        assert_eq!(
            info.segments,
            vec![
                Segment::Literal("notes".to_string()),
                Segment::Variable("id".to_string()),
            ]
        );
    }

    #[test]
    fn test_template_without_leading_slash() {
        let a = RouteInfo::new(RequestKind::Push, "session/login", true);
        let b = RouteInfo::new(RequestKind::Push, "/session/login/", true);
        assert_eq!(a.segments, b.segments);
    }

    #[test]
    fn test_root_template_has_no_segments() {
        let info = RouteInfo::new(RequestKind::Pull, "/", true);
        assert!(info.segments.is_empty());
        assert!(info.matches(&split_path("/")));
        assert!(info.matches(&split_path("")));
    }

    #[test]
    fn test_split_path_drops_empty_segments() {
        assert_eq!(split_path("//notes///42/"), ["notes", "42"]);
    }

    #[test]
    fn test_matches_positionally() {
        let info = RouteInfo::new(RequestKind::Pull, "/notes/:id", true);
        assert!(info.matches(&split_path("/notes/42")));
        assert!(!info.matches(&split_path("/notes/42/extra")));
        assert!(!info.matches(&split_path("/users/42")));
        assert!(!info.matches(&split_path("/notes")));
    }

    #[test]
    fn test_extract_route_data() {
        let info = RouteInfo::new(RequestKind::Pull, "/users/:user/posts/:post", true);
        let data = info.extract_route_data("/users/ann/posts/7");
        assert_eq!(data.len(), 2);
        assert_eq!(data.get_string("user", ""), "ann");
        assert_eq!(data.get_string("post", ""), "7");
        assert_eq!(data.get_int("post", 0), 7);
    }

    #[test]
    fn test_collisions() {
        let by_id = RouteInfo::new(RequestKind::Pull, "/notes/:id", true);
        let by_name = RouteInfo::new(RequestKind::Pull, "/notes/:name", false);
        let all = RouteInfo::new(RequestKind::Pull, "/notes/all", true);
        let push = RouteInfo::new(RequestKind::Push, "/notes/:id", true);

        assert!(by_id.collides_with(&by_name));
        assert!(!by_id.collides_with(&all));
        assert!(!all.collides_with(&by_id));
        assert!(!by_id.collides_with(&push));
    }

    #[test]
    fn test_specificity_prefers_leftmost_literal() {
        let literal = RouteInfo::new(RequestKind::Pull, "/a/b/:x", true);
        let variable = RouteInfo::new(RequestKind::Pull, "/a/:y/c", true);
        assert!(literal.specificity() > variable.specificity());
    }

    #[test]
    fn test_display() {
        let info = RouteInfo::new(RequestKind::Delete, "notes/:id", false);
        assert_eq!(info.to_string(), "delete:/notes/:id");
    }
}
