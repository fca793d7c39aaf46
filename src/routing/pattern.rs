//! Route pattern compiler
//!
//! A path pattern is split on `/` into literal segments and `:name`
//! parameter segments. A parameter binds exactly one non-empty path segment.

use std::collections::HashMap;

/// One compiled path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Position and name of a path parameter inside a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParam {
    pub index: usize,
    pub name: String,
}

/// Compiled form of a registered route path
#[derive(Debug, Clone)]
pub struct RoutePattern {
    segments: Vec<Segment>,
    parameterized: bool,
}

impl RoutePattern {
    pub fn compile(path: &str) -> Self {
        let segments = path
            .split('/')
            .enumerate()
            .map(|(index, segment)| match segment.strip_prefix(':') {
                // A leading segment has no '/' before it, so it never binds
                Some(name) if index > 0 && !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect::<Vec<_>>();

        let parameterized = segments.iter().any(|s| matches!(s, Segment::Param(_)));

        Self {
            segments,
            parameterized,
        }
    }

    /// Whether the pattern takes part in parameterized scanning
    pub const fn is_parameterized(&self) -> bool {
        self.parameterized
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn params(&self) -> Vec<RouteParam> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| match segment {
                Segment::Param(name) => Some(RouteParam {
                    index,
                    name: name.clone(),
                }),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Check the whole path against the pattern (segment counts must agree)
    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for segment in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            let ok = match segment {
                Segment::Literal(literal) => part == literal,
                Segment::Param(_) => !part.is_empty(),
            };
            if !ok {
                return false;
            }
        }
        parts.next().is_none()
    }

    /// Bind parameter names to the sanitized path segments
    pub fn extract(&self, path: &str) -> Option<HashMap<String, String>> {
        if !self.matches(path) {
            return None;
        }
        let parts: Vec<&str> = path.split('/').collect();
        Some(
            self.params()
                .into_iter()
                .map(|param| (param.name, sanitize_param(parts[param.index])))
                .collect(),
        )
    }
}

/// Strip everything from the first non-word character that is followed by a
/// non-digit character, up to the end of the line.
///
/// `userId,ignored` becomes `userId`, while `a-1` and `v1.2` are kept as is.
/// Characters are Unicode scalar values, so a character outside the Basic
/// Multilingual Plane followed by a digit (`😀1`) is kept; a UTF-16 based
/// matcher would see a surrogate pair there and strip it.
pub fn sanitize_param(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        let strip = is_strip_start(chars[i])
            && chars.get(i + 1).is_some_and(|next| !next.is_ascii_digit());
        if strip {
            i += 2;
            while i < chars.len() && !is_line_terminator(chars[i]) {
                i += 1;
            }
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

const fn is_strip_start(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c == '_' || c == '/')
}

const fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_segments() {
        let pattern = RoutePattern::compile("/api/user/:userId");
        assert!(pattern.is_parameterized());
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal(String::new()),
                Segment::Literal("api".to_string()),
                Segment::Literal("user".to_string()),
                Segment::Param("userId".to_string()),
            ]
        );
        assert_eq!(
            pattern.params(),
            vec![RouteParam {
                index: 3,
                name: "userId".to_string()
            }]
        );
    }

    #[test]
    fn test_literal_pattern_is_not_parameterized() {
        assert!(!RoutePattern::compile("/api/joke").is_parameterized());
        assert!(!RoutePattern::compile("/api/:").is_parameterized());
    }

    #[test]
    fn test_matches_requires_same_segment_count() {
        let pattern = RoutePattern::compile("/api/user/:userId");
        assert!(pattern.matches("/api/user/42"));
        assert!(!pattern.matches("/api/user/42/extra"));
        assert!(!pattern.matches("/api/user"));
        assert!(!pattern.matches("/api/user/"));
        assert!(!pattern.matches("/api/users/42"));
    }

    #[test]
    fn test_extract_multiple_params() {
        let pattern = RoutePattern::compile("/org/:org/repo/:repo");
        let params = pattern.extract("/org/tokio/repo/hyper").unwrap();
        assert_eq!(params.get("org").map(String::as_str), Some("tokio"));
        assert_eq!(params.get("repo").map(String::as_str), Some("hyper"));
        assert!(pattern.extract("/org/tokio/repo").is_none());
    }

    #[test]
    fn test_sanitize_param() {
        assert_eq!(sanitize_param("42"), "42");
        assert_eq!(sanitize_param("userId,ignored"), "userId");
        assert_eq!(sanitize_param("abc<script>"), "abc");
        assert_eq!(sanitize_param("a-1"), "a-1");
        assert_eq!(sanitize_param("v1.2"), "v1.2");
        assert_eq!(sanitize_param("end."), "end.");
        assert_eq!(sanitize_param("snake_case"), "snake_case");
        assert_eq!(sanitize_param("kebab-case"), "kebab");
        assert_eq!(sanitize_param("😀1"), "😀1");
    }
}
