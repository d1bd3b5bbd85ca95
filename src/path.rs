//! Glob-style navigation over nested JSON documents.
//!
//! Patterns are separator-delimited segments:
//! - a literal segment matches a mapping key, or a sequence index when numeric;
//! - `*` matches exactly one level;
//! - `**` matches zero or more levels.
//!
//! Every call to [`search`] is an independent, lazy pre-order traversal. The
//! mutating helpers work on the caller's tree in place and never copy it, so
//! callers that need a before/after comparison must snapshot first.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::constants::patterns::{RECURSIVE_WILDCARD, SEPARATOR, WILDCARD};
use crate::errors::PathError;
use crate::types::PatternString;

/// One concrete step into a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key.
    Key(String),
    /// Sequence position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Concrete location of a value inside a document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend this path by a mapping key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Extend this path by a sequence index.
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Borrowing variant of [`DocPath::key`].
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        self.clone().key(key)
    }

    /// Borrowing variant of [`DocPath::index`].
    pub fn child_index(&self, idx: usize) -> Self {
        self.clone().index(idx)
    }

    /// Steps from the root, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True for the empty path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, if this is not the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl From<Vec<PathSegment>> for DocPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Wildcard,
    Recursive,
}

impl PatternSegment {
    fn accepts(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (PatternSegment::Wildcard, _) => true,
            (PatternSegment::Literal(name), PathSegment::Key(key)) => name == key,
            (PatternSegment::Literal(name), PathSegment::Index(idx)) => {
                name.parse::<usize>().is_ok_and(|parsed| parsed == *idx)
            }
            (PatternSegment::Recursive, _) => false,
        }
    }
}

/// Parsed glob pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    raw: PatternString,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Parse `raw` using `separator` between segments.
    ///
    /// Empty patterns and empty segments (`a..b`, trailing separators) are
    /// rejected. Runs of `**` collapse into one.
    pub fn parse(raw: &str, separator: char) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Malformed {
                pattern: raw.to_string(),
                reason: "pattern is empty".into(),
            });
        }
        let mut segments: Vec<PatternSegment> = Vec::new();
        for (position, part) in raw.split(separator).enumerate() {
            let segment = match part {
                "" => {
                    return Err(PathError::Malformed {
                        pattern: raw.to_string(),
                        reason: format!("segment {position} is empty"),
                    });
                }
                RECURSIVE_WILDCARD => PatternSegment::Recursive,
                WILDCARD => PatternSegment::Wildcard,
                literal => PatternSegment::Literal(literal.to_string()),
            };
            if segment == PatternSegment::Recursive
                && segments.last() == Some(&PatternSegment::Recursive)
            {
                continue;
            }
            segments.push(segment);
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Pattern text as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when `path` is matched by this pattern.
    pub fn matches(&self, path: &DocPath) -> bool {
        match_from(&self.segments, path.segments())
    }
}

impl FromStr for PathPattern {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw, SEPARATOR)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn match_from(pattern: &[PatternSegment], path: &[PathSegment]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((PatternSegment::Recursive, rest)) => {
            (0..=path.len()).any(|skip| match_from(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.accepts(head) && match_from(rest, tail),
            None => false,
        },
    }
}

/// Lazy pre-order iterator returned by [`search`].
pub struct Matches<'a, 'p> {
    pattern: &'p PathPattern,
    stack: Vec<(DocPath, &'a Value)>,
}

impl<'a> Iterator for Matches<'a, '_> {
    type Item = (DocPath, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, value)) = self.stack.pop() {
            match value {
                Value::Object(map) => {
                    for (key, child) in map.iter().rev() {
                        self.stack.push((path.child_key(key.as_str()), child));
                    }
                }
                Value::Array(items) => {
                    for (idx, child) in items.iter().enumerate().rev() {
                        self.stack.push((path.child_index(idx), child));
                    }
                }
                _ => {}
            }
            if !path.is_root() && self.pattern.matches(&path) {
                return Some((path, value));
            }
        }
        None
    }
}

/// Yield every `(path, value)` below `tree` matched by `pattern`, in document order.
///
/// The root itself is never yielded. Matched nodes are still descended into,
/// so nested matches are reported after their ancestors.
pub fn search<'a, 'p>(tree: &'a Value, pattern: &'p PathPattern) -> Matches<'a, 'p> {
    Matches {
        pattern,
        stack: vec![(DocPath::root(), tree)],
    }
}

/// Read the value at `path`, or `None` when any step is absent.
pub fn get<'a>(tree: &'a Value, path: &DocPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(tree, |node, segment| match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(key),
            (PathSegment::Index(idx), Value::Array(items)) => items.get(*idx),
            _ => None,
        })
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(tree: &'a mut Value, path: &DocPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(tree, |node, segment| match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key),
            (PathSegment::Index(idx), Value::Array(items)) => items.get_mut(*idx),
            _ => None,
        })
}

/// Set `value` at `path`, creating missing intermediate containers.
///
/// Missing or `null` steps become a mapping for key segments and a sequence
/// (padded with `null`) for index segments. Sibling data is left untouched.
/// Writing through a scalar is a [`PathError::Conflict`].
pub fn write(tree: &mut Value, path: &DocPath, value: Value) -> Result<(), PathError> {
    let Some((leaf, parents)) = path.segments().split_last() else {
        return Err(PathError::Malformed {
            pattern: String::new(),
            reason: "cannot write to the document root".into(),
        });
    };
    let mut current = tree;
    for segment in parents {
        current = container_slot(current, segment, path)?;
    }
    prepare_container(current, leaf);
    match (leaf, current) {
        (PathSegment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(idx), Value::Array(items)) => {
            if items.len() <= *idx {
                items.resize(idx + 1, Value::Null);
            }
            items[*idx] = value;
            Ok(())
        }
        _ => Err(PathError::Conflict {
            path: path.to_string(),
        }),
    }
}

/// Remove every value matched by `pattern` and return how many were removed.
///
/// Matching nothing is a normal outcome and returns `0`.
pub fn delete(tree: &mut Value, pattern: &PathPattern) -> usize {
    let paths: Vec<DocPath> = search(tree, pattern).map(|(path, _)| path).collect();
    // Reverse document order removes descendants before ancestors and later
    // sequence positions before earlier ones, keeping remaining paths valid.
    let mut removed = 0;
    for path in paths.iter().rev() {
        if remove_at(tree, path).is_some() {
            removed += 1;
        }
    }
    removed
}

/// Remove the single value at `path`, returning it when present.
pub fn remove_at(tree: &mut Value, path: &DocPath) -> Option<Value> {
    let (leaf, parents) = path.segments().split_last()?;
    let parent = get_mut(tree, &DocPath::from(parents.to_vec()))?;
    match (leaf, parent) {
        (PathSegment::Key(key), Value::Object(map)) => map.shift_remove(key),
        (PathSegment::Index(idx), Value::Array(items)) if *idx < items.len() => {
            Some(items.remove(*idx))
        }
        _ => None,
    }
}

fn prepare_container(node: &mut Value, segment: &PathSegment) {
    if node.is_null() {
        *node = match segment {
            PathSegment::Key(_) => Value::Object(Map::new()),
            PathSegment::Index(_) => Value::Array(Vec::new()),
        };
    }
}

fn container_slot<'v>(
    node: &'v mut Value,
    segment: &PathSegment,
    path: &DocPath,
) -> Result<&'v mut Value, PathError> {
    prepare_container(node, segment);
    match (segment, node) {
        (PathSegment::Key(key), Value::Object(map)) => {
            Ok(map.entry(key.clone()).or_insert(Value::Null))
        }
        (PathSegment::Index(idx), Value::Array(items)) => {
            if items.len() <= *idx {
                items.resize(idx + 1, Value::Null);
            }
            Ok(&mut items[*idx])
        }
        _ => Err(PathError::Conflict {
            path: path.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pattern(raw: &str) -> PathPattern {
        raw.parse().unwrap()
    }

    fn paths(tree: &Value, raw: &str) -> Vec<String> {
        let pattern = pattern(raw);
        search(tree, &pattern)
            .map(|(path, _)| path.to_string())
            .collect()
    }

    #[test]
    fn recursive_wildcard_matches_zero_or_more_levels() {
        let doc = json!({
            "Source": {"Title": "Top"},
            "Parts": [
                {"Source": {"Title": "First"}},
                {"Body": {"Source": {"Title": "Deep"}}}
            ]
        });
        assert_eq!(
            paths(&doc, "**.Source"),
            vec!["Source", "Parts.0.Source", "Parts.1.Body.Source"]
        );
    }

    #[test]
    fn search_yields_nested_matches_after_their_ancestor() {
        let doc = json!({"Source": {"Source": {"ID": "x"}}});
        assert_eq!(paths(&doc, "**.Source"), vec!["Source", "Source.Source"]);
    }

    #[test]
    fn single_wildcard_and_numeric_literals_match_indices() {
        let doc = json!({"Parts": [{"Title": "a"}, {"Title": "b"}]});
        assert_eq!(paths(&doc, "Parts.*.Title"), vec!["Parts.0.Title", "Parts.1.Title"]);
        assert_eq!(paths(&doc, "Parts.1.Title"), vec!["Parts.1.Title"]);
    }

    #[test]
    fn search_is_restartable_per_call() {
        let doc = json!({"a": {"ISBN": "1"}, "b": {"ISBN": "2"}});
        let pattern = pattern("**.ISBN");
        let first: Vec<_> = search(&doc, &pattern).collect();
        let second: Vec<_> = search(&doc, &pattern).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for raw in ["", "a..b", "a.", ".a"] {
            assert!(
                matches!(raw.parse::<PathPattern>(), Err(PathError::Malformed { .. })),
                "expected malformed for {raw:?}"
            );
        }
        let collapsed = pattern("**.**.a");
        assert!(collapsed.matches(&DocPath::root().key("a")));
        assert!(collapsed.matches(&DocPath::root().key("x").index(2).key("a")));
    }

    #[test]
    fn write_creates_intermediate_containers_without_touching_siblings() {
        let mut doc = json!({"Source": {"Title": "T"}, "Other": 1});
        let path = DocPath::root().key("Source").key("ID");
        write(&mut doc, &path, json!("abc")).unwrap();
        assert_eq!(doc, json!({"Source": {"Title": "T", "ID": "abc"}, "Other": 1}));

        let mut empty = json!({});
        let deep = DocPath::root().key("a").index(1).key("b");
        write(&mut empty, &deep, json!(true)).unwrap();
        assert_eq!(empty, json!({"a": [null, {"b": true}]}));
    }

    #[test]
    fn write_through_scalar_is_a_conflict() {
        let mut doc = json!({"Source": "plain"});
        let path = DocPath::root().key("Source").key("ID");
        let err = write(&mut doc, &path, json!("x")).unwrap_err();
        assert_eq!(
            err,
            PathError::Conflict {
                path: "Source.ID".into()
            }
        );
    }

    #[test]
    fn delete_removes_every_match_and_tolerates_absence() {
        let mut doc = json!({
            "_try_By": "a",
            "Source": {"_try_By": "b", "Title": "t"},
            "List": [{"_try_By": "c"}, {"keep": 1}]
        });
        assert_eq!(delete(&mut doc, &pattern("**._try_By")), 3);
        assert_eq!(
            doc,
            json!({"Source": {"Title": "t"}, "List": [{}, {"keep": 1}]})
        );
        assert_eq!(delete(&mut doc, &pattern("**._try_By")), 0);
    }

    #[test]
    fn delete_preserves_key_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(delete(&mut doc, &pattern("b")), 1);
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn delete_sequence_elements_from_the_back() {
        let mut doc = json!({"xs": [1, 2, 3]});
        assert_eq!(delete(&mut doc, &pattern("xs.*")), 3);
        assert_eq!(doc, json!({"xs": []}));
    }

    #[test]
    fn get_reports_absent_paths_as_none() {
        let doc = json!({"a": [{"b": 1}]});
        assert_eq!(get(&doc, &DocPath::root().key("a").index(0).key("b")), Some(&json!(1)));
        assert_eq!(get(&doc, &DocPath::root().key("a").index(3)), None);
        assert_eq!(get(&doc, &DocPath::root().key("missing")), None);
    }
}
