use crate::config::RouterConfig;
use crate::constants::SUPPORTED_METHODS;
use crate::dispatch::Dispatcher;
use crate::middleware::{self, Callback, IntoReply, Next};
use crate::path::{self, ParamsSignature, Segment};
use crate::route::RouteRecord;
use crate::trie::Node;
use crate::{Error, Request, Response, Result, SharedError, Timeout};
use hyper::Method;
use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

pub(crate) use self::err_handler::ErrorHandler;

mod err_handler;

pub(crate) struct RouterInner {
    pub(crate) trie: Node<Router>,
    pub(crate) middlewares: Vec<Callback>,
    pub(crate) err_handler: Option<ErrorHandler>,
    pub(crate) config: RouterConfig,
    parent: Weak<Mutex<RouterInner>>,
    children: Vec<Router>,
    routes: Vec<(Method, String)>,
    // The first registration error. Reported by `build`.
    error: Option<Error>,
}

/// A mountable group of routes, middlewares and an error handler.
///
/// `Router` is a cheap handle: clones refer to the same router. Routes are registered
/// through `&self`, so a router can be mounted into another one with [`scope`](Router::scope)
/// and still be extended afterwards. Registration never panics; the first error is kept
/// and returned by [`build`](Router::build), which compiles the router and everything
/// mounted into it into an immutable [`Dispatcher`].
///
/// # Examples
///
/// ```
/// use waypost::{Callback, Next, Request, Response, Router};
///
/// async fn user(req: Request, res: Response, _: Next) {
///     let id = req.param("userId").unwrap();
///     res.text(format!("user {}", id));
/// }
///
/// let api = Router::new();
/// api.get("/users/:userId", user);
///
/// let app = Router::new();
/// app.middleware(Callback::new(|_: Request, _: Response, next: Next| async move { next.proceed() }))
///     .scope("/api", &api);
///
/// let dispatcher = app.build().unwrap();
/// # drop(dispatcher);
/// ```
#[derive(Clone)]
pub struct Router {
    pub(crate) inner: Arc<Mutex<RouterInner>>,
}

macro_rules! verb {
    ($(#[$doc:meta])* $name:ident, $method:expr) => {
        $(#[$doc])*
        pub fn $name<P, H, R, O>(&self, path: P, handler: H) -> &Self
        where
            P: AsRef<str>,
            H: Fn(Request, Response, Next) -> R + Send + Sync + 'static,
            R: Future<Output = O> + Send + 'static,
            O: IntoReply + 'static,
        {
            self.add(&[$method], path.as_ref(), vec![Callback::new(handler)])
        }
    };
}

impl Router {
    pub fn new() -> Router {
        Router::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Router {
        let config = RouterConfig {
            base_path: RouterConfig::normalize_base_path(&config.base_path),
            ..config
        };

        Router {
            inner: Arc::new(Mutex::new(RouterInner {
                trie: Node::new(),
                middlewares: Vec::new(),
                err_handler: None,
                config,
                parent: Weak::new(),
                children: Vec::new(),
                routes: Vec::new(),
                error: None,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RouterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    verb!(
        /// Adds a handler for `GET` requests at `path`.
        get,
        Method::GET
    );
    verb!(
        /// Adds a handler for `POST` requests at `path`.
        post,
        Method::POST
    );
    verb!(put, Method::PUT);
    verb!(delete, Method::DELETE);
    verb!(patch, Method::PATCH);
    verb!(options, Method::OPTIONS);
    verb!(head, Method::HEAD);

    /// Adds a handler for every supported method at `path`.
    pub fn all<P, H, R, O>(&self, path: P, handler: H) -> &Self
    where
        P: AsRef<str>,
        H: Fn(Request, Response, Next) -> R + Send + Sync + 'static,
        R: Future<Output = O> + Send + 'static,
        O: IntoReply + 'static,
    {
        self.add(&SUPPORTED_METHODS, path.as_ref(), vec![Callback::new(handler)])
    }

    /// Adds a chain of callbacks for the given methods at `path`.
    ///
    /// The callbacks run in order, each one moving on with [`Next::proceed`]. An empty chain
    /// lets the request run through the router's middlewares only, ending in a 404 unless one
    /// of them answers.
    pub fn route<P: AsRef<str>>(&self, methods: &[Method], path: P, callbacks: Vec<Callback>) -> &Self {
        self.add(methods, path.as_ref(), callbacks)
    }

    fn add(&self, methods: &[Method], path: &str, callbacks: Vec<Callback>) -> &Self {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.error.is_some() {
            return self;
        }

        let segments = path::tokenize(path);
        let signature = ParamsSignature::of(&segments);
        let node = match inner.trie.insert(path, &segments, &signature) {
            Ok(node) => node,
            Err(err) => {
                warn!(error = %err, "route registration failed");
                inner.error = Some(err);
                return self;
            }
        };

        for method in methods {
            let record = RouteRecord::new(path, callbacks.clone(), inner.middlewares.clone());
            node.methods.insert(method.clone(), record);
            inner.routes.push((method.clone(), path.to_owned()));
            debug!(method = %method, path, "route registered");
        }

        self
    }

    /// Appends a middleware to this router and every router mounted under it.
    ///
    /// Routes registered later get it as a pre-middleware. Routes that already exist get it
    /// after their own callbacks.
    pub fn middleware(&self, callback: Callback) -> &Self {
        for router in self.subtree() {
            let mut inner = router.lock();
            inner.trie.for_each_record_mut(&mut |record| record.post.push(callback.clone()));
            inner.middlewares.push(callback.clone());
        }
        self
    }

    /// Mounts `child` at `path`. See [`scope_with`](Router::scope_with).
    pub fn scope<P: AsRef<str>>(&self, path: P, child: &Router) -> &Self {
        self.scope_with(path, Vec::new(), child)
    }

    /// Mounts `child` at `path`, running `middlewares` before everything in `child`.
    ///
    /// The middlewares of this router and of its ancestors, outermost first, then `middlewares`,
    /// are put in front of the middlewares of `child` and of every router already mounted
    /// under it, and in front of the pre-middlewares of all their routes. A router can only
    /// be mounted once.
    pub fn scope_with<P: AsRef<str>>(&self, path: P, middlewares: Vec<Callback>, child: &Router) -> &Self {
        let path = path.as_ref();
        if let Err(err) = self.mount(path, middlewares, child) {
            warn!(error = %err, "router mount failed");
            let mut inner = self.lock();
            if inner.error.is_none() {
                inner.error = Some(err);
            }
        }
        self
    }

    fn mount(&self, path: &str, middlewares: Vec<Callback>, child: &Router) -> Result<()> {
        if self.same(child) || self.ancestors().iter().any(|ancestor| ancestor.same(child)) {
            return Err(Error::MountCycle { path: path.to_owned() });
        }
        if child.parent().is_some() {
            return Err(Error::AlreadyMounted { path: path.to_owned() });
        }

        {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let segments = path::tokenize(path);
            if let Some(Segment::Wildcard { .. }) = segments.last() {
                return Err(Error::InvalidRoute {
                    path: path.to_owned(),
                    reason: "a router can't be mounted on a wildcard".to_owned(),
                });
            }
            let signature = ParamsSignature::of(&segments);
            let node = inner.trie.insert(path, &segments, &signature)?;
            if node.mount.is_some() {
                return Err(Error::PathAlreadyMounted { path: path.to_owned() });
            }
            node.mount = Some(child.clone());
            inner.children.push(child.clone());
        }
        child.lock().parent = Arc::downgrade(&self.inner);

        let mut inherited = Vec::new();
        for ancestor in child.ancestors().iter().rev() {
            inherited.extend(ancestor.lock().middlewares.iter().cloned());
        }
        let mut inherited = middleware::dedup(inherited);
        inherited.extend(middlewares);

        for router in child.subtree() {
            let mut inner = router.lock();
            inner.trie.for_each_record_mut(&mut |record| record.prepend(&inherited));
            inner.middlewares.splice(0..0, inherited.iter().cloned());
        }

        debug!(path, inherited = inherited.len(), "router mounted");
        Ok(())
    }

    /// Sets the error handler of this router.
    ///
    /// When a request fails, the handlers of the router that owns the request and of its
    /// ancestors run innermost first, skipping routers without a handler of their own.
    /// The root router always takes part, with a built-in handler if none was set.
    ///
    /// Unlike route callbacks, a handler's step ends as soon as its future completes.
    /// A [`Next::fail`] issued later, e.g. from a task the handler spawned, is ignored.
    pub fn err_handler<H, R, O>(&self, handler: H) -> &Self
    where
        H: Fn(SharedError, Request, Response, Next) -> R + Send + Sync + 'static,
        R: Future<Output = O> + Send + 'static,
        O: IntoReply + 'static,
    {
        self.lock().err_handler = Some(ErrorHandler::new(handler));
        self
    }

    pub fn set_timeout<T: Into<Timeout>>(&self, timeout: T) -> &Self {
        self.lock().config.timeout = timeout.into();
        self
    }

    pub fn set_base_path<P: AsRef<str>>(&self, base_path: P) -> &Self {
        self.lock().config.base_path = RouterConfig::normalize_base_path(base_path.as_ref());
        self
    }

    pub fn set_treat_return_as_response(&self, enabled: bool) -> &Self {
        self.lock().config.treat_return_as_response = enabled;
        self
    }

    pub fn set_development(&self, enabled: bool) -> &Self {
        self.lock().config.development = enabled;
        self
    }

    pub fn config(&self) -> RouterConfig {
        self.lock().config.clone()
    }

    /// The registered `(method, path)` pairs of this router, in registration order.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.lock().routes.clone()
    }

    pub fn parent(&self) -> Option<Router> {
        self.lock().parent.upgrade().map(|inner| Router { inner })
    }

    /// Compiles this router and the routers mounted under it.
    ///
    /// Later changes to any of the routers don't affect the returned dispatcher.
    pub fn build(&self) -> Result<Dispatcher> {
        for router in self.subtree() {
            if let Some(err) = router.lock().error.clone() {
                return Err(err);
            }
        }
        Ok(Dispatcher::compile(self))
    }

    fn same(&self, other: &Router) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // Nearest first.
    fn ancestors(&self) -> Vec<Router> {
        let mut ancestors = Vec::new();
        let mut cursor = self.parent();
        while let Some(router) = cursor {
            cursor = router.parent();
            ancestors.push(router);
        }
        ancestors
    }

    // This router and every router mounted under it, breadth first.
    fn subtree(&self) -> Vec<Router> {
        let mut routers = Vec::new();
        let mut queue = VecDeque::from([self.clone()]);
        while let Some(router) = queue.pop_front() {
            queue.extend(router.lock().children.iter().cloned());
            routers.push(router);
        }
        routers
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        write!(
            f,
            "Router {{ routes: {:?}, middlewares: {}, children: {}, err_handler: {} }}",
            inner.routes,
            inner.middlewares.len(),
            inner.children.len(),
            inner.err_handler.is_some()
        )
    }
}
