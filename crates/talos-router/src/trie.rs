//! Prefix-tree path matching.
//!
//! Each node owns one path segment. Static children are kept sorted for
//! binary search; at most one parameter child and one catch-all child exist
//! per node. Match priority is static, then parameter, then catch-all, with
//! backtracking when a deeper static branch dead-ends.

use crate::method_router::MethodRouter;
use crate::params::Params;

/// What a path segment matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Verbatim text, e.g. `users`.
    Literal(String),
    /// Named single-segment parameter, e.g. `{id}`.
    Param(String),
    /// Named catch-all consuming the rest of the path, e.g. `*rest`.
    CatchAll(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Self::Param(name.to_string())
        } else if let Some(name) = raw.strip_prefix('*') {
            Self::CatchAll(name.to_string())
        } else {
            Self::Literal(raw.to_string())
        }
    }
}

/// A node in the prefix tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    literal: String,
    methods: Option<MethodRouter>,
    literal_children: Vec<Node>,
    param_child: Option<Box<(String, Node)>>,
    catch_all: Option<(String, MethodRouter)>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self::empty(String::new())
    }

    fn empty(literal: String) -> Self {
        Self {
            literal,
            methods: None,
            literal_children: Vec::new(),
            param_child: None,
            catch_all: None,
        }
    }

    /// Inserts a route pattern, merging method tables on collision.
    ///
    /// # Panics
    ///
    /// Panics if a catch-all segment is not the final segment. Route
    /// registration happens once at startup, so this is a programmer error,
    /// not a runtime condition.
    pub(crate) fn insert(&mut self, pattern: &str, methods: MethodRouter) {
        let segments: Vec<Segment> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect();
        self.insert_at(&segments, methods);
    }

    fn insert_at(&mut self, segments: &[Segment], methods: MethodRouter) {
        let Some((head, rest)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                slot @ None => *slot = Some(methods),
            }
            return;
        };

        match head {
            Segment::Literal(text) => {
                let child = match self
                    .literal_children
                    .binary_search_by(|c| c.literal.as_str().cmp(text))
                {
                    Ok(i) => &mut self.literal_children[i],
                    Err(i) => {
                        self.literal_children.insert(i, Node::empty(text.clone()));
                        &mut self.literal_children[i]
                    }
                };
                child.insert_at(rest, methods);
            }
            Segment::Param(name) => {
                let (_, child) = &mut **self
                    .param_child
                    .get_or_insert_with(|| Box::new((name.clone(), Node::empty(String::new()))));
                child.insert_at(rest, methods);
            }
            Segment::CatchAll(name) => {
                assert!(rest.is_empty(), "catch-all must be the final segment");
                match &mut self.catch_all {
                    Some((_, existing)) => existing.merge(methods),
                    slot @ None => *slot = Some((name.clone(), methods)),
                }
            }
        }
    }

    /// Matches a request path, returning the method table and extracted
    /// parameters.
    pub(crate) fn find(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.find_at(&segments, &mut params)?;
        Some((methods, params))
    }

    fn find_at<'n>(&'n self, segments: &[&str], params: &mut Params) -> Option<&'n MethodRouter> {
        let Some((head, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Ok(i) = self
            .literal_children
            .binary_search_by(|c| c.literal.as_str().cmp(head))
        {
            if let Some(found) = self.literal_children[i].find_at(rest, params) {
                return Some(found);
            }
        }

        if let Some(boxed) = &self.param_child {
            let (name, child) = boxed.as_ref();
            let mark = params.len();
            params.push(name.clone(), (*head).to_string());
            if let Some(found) = child.find_at(rest, params) {
                return Some(found);
            }
            params.truncate(mark);
        }

        if let Some((name, methods)) = &self.catch_all {
            params.push(name.clone(), segments.join("/"));
            return Some(methods);
        }

        None
    }
}
