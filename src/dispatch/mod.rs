use crate::helpers;
use crate::middleware::Callback;
use crate::path;
use crate::router::{ErrorHandler, Router};
use crate::trie::{self, Lookup, Mounted, Node};
use crate::{Error, Request, Response, Result, RoutingError, Timeout};
use http_body_util::Full;
use hyper::body::Bytes;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error};

mod error_chain;
mod pipeline;

/// Index of a router in the dispatcher's arena.
pub(crate) type RouterId = usize;

const ROOT: RouterId = 0;

pub(crate) struct RouterEntry {
    pub(crate) parent: Option<RouterId>,
    pub(crate) middlewares: Vec<Callback>,
    pub(crate) err_handler: Option<ErrorHandler>,
    pub(crate) timeout: Timeout,
}

/// An immutable, compiled router tree ready to serve requests.
///
/// Built with [`Router::build`]. Requests only read it, so it can be shared between
/// connections behind an `Arc` and serve any number of requests concurrently.
pub struct Dispatcher {
    root: Node<Mounted>,
    routers: Vec<RouterEntry>,
    base_path: String,
    treat_return_as_response: bool,
    fallback_handler: ErrorHandler,
}

impl Dispatcher {
    pub(crate) fn compile(router: &Router) -> Dispatcher {
        let mut routers = Vec::new();
        let (_, root) = compile_router(router, None, &mut routers);
        let config = router.config();

        debug!(routers = routers.len(), "router compiled");

        Dispatcher {
            root,
            routers,
            base_path: config.base_path,
            treat_return_as_response: config.treat_return_as_response,
            fallback_handler: ErrorHandler::fallback(config.development),
        }
    }

    /// Routes a request with an already collected body.
    ///
    /// Routing and callback failures are answered by the error handlers. An `Err` is only
    /// returned when none of them sent a response.
    pub async fn dispatch(&self, req: hyper::Request<Bytes>) -> Result<hyper::Response<Full<Bytes>>> {
        self.dispatch_from(req, None).await
    }

    pub async fn dispatch_from(
        &self,
        req: hyper::Request<Bytes>,
        remote_addr: Option<SocketAddr>,
    ) -> Result<hyper::Response<Full<Bytes>>> {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let req = Request::from_parts(parts, body, remote_addr);
        let res = Response::new();

        let target = self.strip_base_path(req.path());
        let segments = path::split_request_path(target);
        req.set_query(helpers::parse_query(req.uri().query()));

        debug!(method = %req.method(), path = req.path(), "dispatching request");

        match trie::lookup(&self.root, ROOT, &segments, req.method()) {
            Lookup::Found { record, params, owner } => {
                req.set_params(params);
                pipeline::run(self, record, owner, &req, &res, started).await;
            }
            Lookup::NotFound { owner } => {
                error_chain::resolve(self, owner, Arc::new(RoutingError::NotFound), &req, &res).await;
            }
            Lookup::MethodNotAllowed { owner } => {
                error_chain::resolve(self, owner, Arc::new(RoutingError::MethodNotAllowed), &req, &res).await;
            }
        }

        res.take_http().ok_or_else(|| {
            error!(path = req.path(), "no error handler sent a response");
            Error::Unanswered {
                path: req.path().to_owned(),
            }
        })
    }

    pub(crate) fn router(&self, id: RouterId) -> &RouterEntry {
        &self.routers[id]
    }

    pub(crate) fn treat_return_as_response(&self) -> bool {
        self.treat_return_as_response
    }

    /// The error handlers for a failure in `owner`, innermost first.
    pub(crate) fn error_handlers(&self, owner: RouterId) -> Vec<ErrorHandler> {
        let mut handlers = Vec::new();
        let mut cursor = Some(owner);

        while let Some(id) = cursor {
            let entry = self.router(id);
            match (&entry.err_handler, entry.parent) {
                (Some(handler), _) => handlers.push(handler.clone()),
                (None, None) => handlers.push(self.fallback_handler.clone()),
                (None, Some(_)) => {}
            }
            cursor = entry.parent;
        }

        handlers
    }

    fn strip_base_path<'p>(&self, path: &'p str) -> &'p str {
        if self.base_path.is_empty() {
            return path;
        }

        match path.strip_prefix(self.base_path.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dispatcher {{ routers: {}, base_path: {:?}, treat_return_as_response: {} }}",
            self.routers.len(),
            self.base_path,
            self.treat_return_as_response
        )
    }
}

// Assigns ids depth first, so a router's parent always has a smaller id.
fn compile_router(router: &Router, parent: Option<RouterId>, routers: &mut Vec<RouterEntry>) -> (RouterId, Node<Mounted>) {
    let inner = router.lock();
    let id = routers.len();
    routers.push(RouterEntry {
        parent,
        middlewares: inner.middlewares.clone(),
        err_handler: inner.err_handler.clone(),
        timeout: inner.config.timeout.clone(),
    });

    let trie = inner.trie.map_mounts(&mut |child: &Router| {
        let (router, root) = compile_router(child, Some(id), routers);
        Mounted {
            router,
            root: Box::new(root),
        }
    });

    (id, trie)
}
