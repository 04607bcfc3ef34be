use crate::middleware::Callback;
use std::fmt::{self, Debug, Formatter};

/// The callbacks registered for one method on one trie node.
///
/// `pre` is the owning router's middleware collection at registration time. Mounting the
/// router later prepends the ancestors' middlewares to it. `post` collects the middlewares
/// added to the router, or to one of its ancestors, after the route was registered.
#[derive(Clone)]
pub(crate) struct RouteRecord {
    pub(crate) path: String,
    pub(crate) callbacks: Vec<Callback>,
    pub(crate) pre: Vec<Callback>,
    pub(crate) post: Vec<Callback>,
}

impl RouteRecord {
    pub(crate) fn new(path: &str, callbacks: Vec<Callback>, pre: Vec<Callback>) -> RouteRecord {
        RouteRecord {
            path: path.to_owned(),
            callbacks,
            pre,
            post: Vec::new(),
        }
    }

    /// `pre`, then the route callbacks, then `post`.
    pub(crate) fn chain(&self) -> Vec<Callback> {
        self.pre
            .iter()
            .chain(self.callbacks.iter())
            .chain(self.post.iter())
            .cloned()
            .collect()
    }

    pub(crate) fn prepend(&mut self, middlewares: &[Callback]) {
        self.pre.splice(0..0, middlewares.iter().cloned());
    }
}

impl Debug for RouteRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RouteRecord {{ path: {:?}, pre: {}, callbacks: {}, post: {} }}",
            self.path,
            self.pre.len(),
            self.callbacks.len(),
            self.post.len()
        )
    }
}
