use crate::dispatch::RouterId;
use crate::path::{ParamsSignature, Segment};
use crate::route::RouteRecord;
use crate::{Error, Result};
use hyper::Method;
use std::collections::HashMap;

pub(crate) use self::matcher::{lookup, Lookup};

mod matcher;

/// A node of the route trie.
///
/// `M` is what a mount point holds: the mounted router while registering, its compiled
/// trie once the router is built.
pub(crate) struct Node<M> {
    literals: HashMap<String, Node<M>>,
    param: Option<Box<Node<M>>>,
    // Only filled on parameter nodes.
    param_names: HashMap<ParamsSignature, String>,
    // Longest first. A bare `*` registers the empty prefix.
    wildcard_prefixes: Vec<String>,
    wildcards: HashMap<String, Node<M>>,
    pub(crate) methods: HashMap<Method, RouteRecord>,
    pub(crate) mount: Option<M>,
}

/// A compiled mount point: the mounted router and its trie.
pub(crate) struct Mounted {
    pub(crate) router: RouterId,
    pub(crate) root: Box<Node<Mounted>>,
}

impl<M> Node<M> {
    pub(crate) fn new() -> Node<M> {
        Node {
            literals: HashMap::new(),
            param: None,
            param_names: HashMap::new(),
            wildcard_prefixes: Vec::new(),
            wildcards: HashMap::new(),
            methods: HashMap::new(),
            mount: None,
        }
    }

    /// Walks `segments` down from this node, creating nodes as needed, and returns the last one.
    pub(crate) fn insert(&mut self, route: &str, segments: &[Segment], signature: &ParamsSignature) -> Result<&mut Node<M>> {
        let mut node = self;

        for (idx, segment) in segments.iter().enumerate() {
            node = match segment {
                Segment::Literal(literal) => node.literals.entry(literal.clone()).or_insert_with(Node::new),
                Segment::Param(name) => {
                    if name.is_empty() {
                        return Err(invalid_route(route, "a parameter needs a name"));
                    }
                    let child = node.param.get_or_insert_with(|| Box::new(Node::new()));
                    child.param_names.insert(signature.clone(), name.clone());
                    &mut **child
                }
                Segment::Wildcard { prefix } => {
                    if idx + 1 != segments.len() {
                        return Err(invalid_route(route, "a wildcard must be the last segment"));
                    }
                    if !node.wildcard_prefixes.contains(prefix) {
                        node.wildcard_prefixes.push(prefix.clone());
                        node.wildcard_prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
                    }
                    node.wildcards.entry(prefix.clone()).or_insert_with(Node::new)
                }
            };
        }

        Ok(node)
    }

    pub(crate) fn literal(&self, segment: &str) -> Option<&Node<M>> {
        self.literals.get(segment)
    }

    pub(crate) fn param(&self) -> Option<&Node<M>> {
        self.param.as_deref()
    }

    pub(crate) fn param_name(&self, signature: &ParamsSignature) -> Option<&String> {
        self.param_names.get(signature)
    }

    /// The wildcard child for a request segment: the longest registered prefix the segment
    /// starts with, else the bare wildcard.
    pub(crate) fn wildcard(&self, segment: &str) -> Option<&Node<M>> {
        let prefix = self
            .wildcard_prefixes
            .iter()
            .find(|prefix| segment.starts_with(prefix.as_str()))
            .map(String::as_str)
            .unwrap_or("");

        self.wildcards.get(prefix).or_else(|| self.wildcards.get(""))
    }

    /// Visits every route record of this trie. Mounted tries are not entered.
    pub(crate) fn for_each_record_mut(&mut self, f: &mut dyn FnMut(&mut RouteRecord)) {
        self.methods.values_mut().for_each(|record| f(record));

        for child in self.literals.values_mut().chain(self.wildcards.values_mut()) {
            child.for_each_record_mut(f);
        }
        if let Some(param) = self.param.as_mut() {
            param.for_each_record_mut(f);
        }
    }

    /// Copies the trie, converting every mount point with `f`.
    pub(crate) fn map_mounts<N>(&self, f: &mut dyn FnMut(&M) -> N) -> Node<N> {
        let mut literals = HashMap::with_capacity(self.literals.len());
        for (key, child) in &self.literals {
            literals.insert(key.clone(), child.map_mounts(f));
        }

        let mut wildcards = HashMap::with_capacity(self.wildcards.len());
        for (key, child) in &self.wildcards {
            wildcards.insert(key.clone(), child.map_mounts(f));
        }

        let param = match &self.param {
            Some(param) => Some(Box::new(param.map_mounts(f))),
            None => None,
        };

        Node {
            literals,
            param,
            param_names: self.param_names.clone(),
            wildcard_prefixes: self.wildcard_prefixes.clone(),
            wildcards,
            methods: self.methods.clone(),
            mount: self.mount.as_ref().map(|mount| f(mount)),
        }
    }
}

fn invalid_route(route: &str, reason: &str) -> Error {
    Error::InvalidRoute {
        path: route.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::tokenize;

    fn insert(node: &mut Node<()>, route: &str) -> Result<()> {
        let segments = tokenize(route);
        let signature = ParamsSignature::of(&segments);
        let terminal = node.insert(route, &segments, &signature)?;
        terminal
            .methods
            .insert(Method::GET, RouteRecord::new(route, Vec::new(), Vec::new()));
        Ok(())
    }

    #[test]
    fn should_share_param_node_between_names() {
        let mut root = Node::<()>::new();
        insert(&mut root, "/user/:userId").unwrap();
        insert(&mut root, "/user/:uid/posts").unwrap();

        let param = root.literal("user").unwrap().param().unwrap();
        let first = ParamsSignature::of(&tokenize("/user/:userId"));
        let second = ParamsSignature::of(&tokenize("/user/:uid/posts"));
        assert_eq!(param.param_name(&first).map(String::as_str), Some("userId"));
        assert_eq!(param.param_name(&second).map(String::as_str), Some("uid"));
    }

    #[test]
    fn should_prefer_longest_wildcard_prefix() {
        let mut root = Node::<()>::new();
        insert(&mut root, "/f/a*").unwrap();
        insert(&mut root, "/f/abc*").unwrap();
        insert(&mut root, "/f/*").unwrap();

        let f = root.literal("f").unwrap();
        let path_of = |node: &Node<()>| node.methods[&Method::GET].path.clone();
        assert_eq!(path_of(f.wildcard("abcd").unwrap()), "/f/abc*");
        assert_eq!(path_of(f.wildcard("ab").unwrap()), "/f/a*");
        assert_eq!(path_of(f.wildcard("zzz").unwrap()), "/f/*");
    }

    #[test]
    fn should_reject_malformed_routes() {
        let mut root = Node::<()>::new();
        assert!(matches!(insert(&mut root, "/a/*/b"), Err(Error::InvalidRoute { .. })));
        assert!(matches!(insert(&mut root, "/a/:"), Err(Error::InvalidRoute { .. })));
    }

    #[test]
    fn should_visit_every_record() {
        let mut root = Node::<()>::new();
        insert(&mut root, "/").unwrap();
        insert(&mut root, "/a/:b").unwrap();
        insert(&mut root, "/c/*").unwrap();

        let mut count = 0;
        root.for_each_record_mut(&mut |_| count += 1);
        assert_eq!(count, 3);
    }
}
