use crate::constants::BASE_SEGMENT;
use crate::dispatch::RouterId;
use crate::helpers;
use crate::path::ParamsSignature;
use crate::route::RouteRecord;
use crate::trie::{Mounted, Node};
use crate::types::{ParamValue, RouteParams};
use hyper::Method;

#[derive(Debug)]
pub(crate) enum Lookup<'a> {
    Found {
        record: &'a RouteRecord,
        params: RouteParams,
        owner: RouterId,
    },
    NotFound {
        owner: RouterId,
    },
    MethodNotAllowed {
        owner: RouterId,
    },
}

// A parameter segment waiting for its name. Names depend on the signature of the whole
// route, which is only known once the walk leaves the router that owns the segment.
struct PendingParam<'a> {
    node: &'a Node<Mounted>,
    pos: usize,
    raw: &'a str,
}

struct Fallback<'a> {
    node: &'a Node<Mounted>,
    owner: RouterId,
    params: RouteParams,
}

/// Binds the pending parameters of a router whose part of the walk started at `start` and
/// spans `len` route segments.
fn bind(pending: &[PendingParam<'_>], start: usize, len: usize, params: &mut RouteParams) {
    if pending.is_empty() {
        return;
    }

    let signature = ParamsSignature {
        positions: pending.iter().map(|param| param.pos - start).collect(),
        len,
    };

    for param in pending {
        if let Some(name) = param.node.param_name(&signature) {
            params.set(name.clone(), ParamValue::parse(param.raw));
        }
    }
}

/// Resolves a request path against a compiled trie.
///
/// At every node the first wildcard seen is remembered as a fallback, then the walk goes
/// on through the literal child, else the parameter child. A walk that can't go on, or
/// ends on a node without routes, falls back to the wildcard. Mount points hand the rest
/// of the walk to the mounted router's trie.
pub(crate) fn lookup<'a>(root: &'a Node<Mounted>, root_id: RouterId, segments: &[&'a str], method: &Method) -> Lookup<'a> {
    let mut node = root;
    let mut owner = root_id;
    let mut start = 0;
    let mut params = RouteParams::new();
    let mut pending: Vec<PendingParam<'a>> = Vec::new();
    let mut fallback: Option<Fallback<'a>> = None;
    let mut walked_all = true;

    for (idx, raw) in segments.iter().copied().enumerate() {
        if let Some(mounted) = &node.mount {
            bind(&pending, start, idx - start, &mut params);
            pending.clear();
            start = idx;
            owner = mounted.router;
            node = mounted.root.as_ref();
        }

        if fallback.is_none() {
            if let Some(wildcard) = node.wildcard(raw) {
                let mut snapshot = params.clone();
                bind(&pending, start, idx - start + 1, &mut snapshot);
                fallback = Some(Fallback {
                    node: wildcard,
                    owner,
                    params: snapshot,
                });
            }
        }

        if let Some(next) = node.literal(&helpers::decode(raw)) {
            node = next;
        } else if let Some(next) = node.param() {
            pending.push(PendingParam { node: next, pos: idx, raw });
            node = next;
        } else {
            walked_all = false;
            break;
        }
    }

    let mut terminal = None;
    if walked_all {
        let len = segments.len() - start;
        bind(&pending, start, len, &mut params);

        // A path ending on a mount point targets the mounted router's base route.
        if let Some(mounted) = &node.mount {
            owner = mounted.router;
            node = mounted.root.as_ref();
            if fallback.is_none() {
                if let Some(wildcard) = node.wildcard(BASE_SEGMENT) {
                    fallback = Some(Fallback {
                        node: wildcard,
                        owner,
                        params: params.clone(),
                    });
                }
            }
            terminal = node.literal(BASE_SEGMENT);
        } else {
            terminal = Some(node);
        }
    }

    let (target, owner, params) = match terminal.filter(|node| !node.methods.is_empty()) {
        Some(node) => (node, owner, params),
        None => match fallback {
            Some(fallback) if !fallback.node.methods.is_empty() => (fallback.node, fallback.owner, fallback.params),
            _ => return Lookup::NotFound { owner },
        },
    };

    match target.methods.get(method) {
        Some(record) => Lookup::Found { record, params, owner },
        None => Lookup::MethodNotAllowed { owner },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{split_request_path, tokenize};

    fn route(node: &mut Node<Mounted>, method: Method, path: &str) {
        let segments = tokenize(path);
        let signature = ParamsSignature::of(&segments);
        node.insert(path, &segments, &signature)
            .unwrap()
            .methods
            .insert(method, RouteRecord::new(path, Vec::new(), Vec::new()));
    }

    fn mount(node: &mut Node<Mounted>, path: &str, router: RouterId, root: Node<Mounted>) {
        let segments = tokenize(path);
        let signature = ParamsSignature::of(&segments);
        node.insert(path, &segments, &signature).unwrap().mount = Some(Mounted {
            router,
            root: Box::new(root),
        });
    }

    fn find<'a>(root: &'a Node<Mounted>, method: Method, path: &'a str) -> Lookup<'a> {
        lookup(root, 0, &split_request_path(path), &method)
    }

    fn found(lookup: Lookup<'_>) -> (String, RouteParams, RouterId) {
        match lookup {
            Lookup::Found { record, params, owner } => (record.path.clone(), params, owner),
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn should_bind_names_by_signature() {
        let mut root = Node::new();
        route(&mut root, Method::GET, "/user/:userId/post/:postId");
        route(&mut root, Method::GET, "/user/:uid/post/:pid/followers");

        let (path, params, _) = found(find(&root, Method::GET, "/user/1/post/2"));
        assert_eq!(path, "/user/:userId/post/:postId");
        assert_eq!(params.get("userId"), Some(&ParamValue::Number(1.0)));
        assert_eq!(params.get("postId"), Some(&ParamValue::Number(2.0)));

        let (_, params, _) = found(find(&root, Method::GET, "/user/1/post/2/followers"));
        assert_eq!(params.get("uid"), Some(&ParamValue::Number(1.0)));
        assert_eq!(params.get("pid"), Some(&ParamValue::Number(2.0)));
        assert!(!params.has("userId"));
    }

    #[test]
    fn should_prefer_literals_over_params() {
        let mut root = Node::new();
        route(&mut root, Method::GET, "/user/me");
        route(&mut root, Method::GET, "/user/:id");

        assert_eq!(found(find(&root, Method::GET, "/user/me")).0, "/user/me");
        assert_eq!(found(find(&root, Method::GET, "/user/you")).0, "/user/:id");
    }

    #[test]
    fn should_match_prefixed_wildcards() {
        let mut root = Node::new();
        route(&mut root, Method::GET, "/prefix/abc*");

        assert!(matches!(find(&root, Method::GET, "/prefix/other/x"), Lookup::NotFound { .. }));
        assert_eq!(found(find(&root, Method::GET, "/prefix/abcdef/x")).0, "/prefix/abc*");
    }

    #[test]
    fn should_bind_params_before_wildcard() {
        let mut root = Node::new();
        route(&mut root, Method::GET, "/files/:owner/*");

        let (_, params, _) = found(find(&root, Method::GET, "/files/bob/a/b/c"));
        assert_eq!(params.get("owner"), Some(&ParamValue::Text("bob".to_owned())));
    }

    #[test]
    fn should_tell_method_not_allowed_from_not_found() {
        let mut root = Node::new();
        route(&mut root, Method::GET, "/a");

        assert!(matches!(find(&root, Method::POST, "/a"), Lookup::MethodNotAllowed { .. }));
        assert!(matches!(find(&root, Method::GET, "/b"), Lookup::NotFound { .. }));
        assert!(matches!(find(&root, Method::GET, "/"), Lookup::NotFound { .. }));
    }

    #[test]
    fn should_walk_into_mounted_tries() {
        let mut child = Node::new();
        route(&mut child, Method::GET, "/");
        route(&mut child, Method::GET, "/:postId");

        let mut root = Node::new();
        mount(&mut root, "/users/:userId/posts", 1, child);

        let (path, params, owner) = found(find(&root, Method::GET, "/users/7/posts/9"));
        assert_eq!(path, "/:postId");
        assert_eq!(owner, 1);
        assert_eq!(params.get("userId"), Some(&ParamValue::Number(7.0)));
        assert_eq!(params.get("postId"), Some(&ParamValue::Number(9.0)));

        let (path, params, owner) = found(find(&root, Method::GET, "/users/7/posts"));
        assert_eq!(path, "/");
        assert_eq!(owner, 1);
        assert_eq!(params.get("userId"), Some(&ParamValue::Number(7.0)));
    }

    #[test]
    fn should_report_mounted_router_as_owner_when_not_found() {
        let mut child = Node::new();
        route(&mut child, Method::GET, "/x");

        let mut root = Node::new();
        mount(&mut root, "/api", 3, child);

        assert!(matches!(find(&root, Method::GET, "/api/y"), Lookup::NotFound { owner: 3 }));
        assert!(matches!(find(&root, Method::GET, "/nope"), Lookup::NotFound { owner: 0 }));
    }

    #[test]
    fn should_compare_literals_decoded() {
        let mut root = Node::new();
        route(&mut root, Method::GET, "/hello world");
        route(&mut root, Method::GET, "/caf\u{e9}");

        // Spaces are stripped from route patterns.
        assert_eq!(found(find(&root, Method::GET, "/helloworld")).0, "/hello world");
        assert_eq!(found(find(&root, Method::GET, "/caf%C3%A9")).0, "/caf\u{e9}");
    }
}
