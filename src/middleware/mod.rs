use crate::{Request, Response, RouteError};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use self::next::Next;
pub(crate) use self::next::StepSignal;
pub use self::reply::{IntoReply, Reply};

mod next;
mod reply;

type Handler = Arc<dyn Fn(Request, Response, Next) -> HandlerReturn + Send + Sync + 'static>;
type HandlerReturn = Box<dyn Future<Output = Result<Reply, RouteError>> + Send + 'static>;

pub(crate) type CallbackFuture = Pin<HandlerReturn>;

/// A middleware or route callback.
///
/// Every step of a request pipeline is a `Callback`: the middlewares of the routers on the
/// way, the route's own callbacks and the middlewares added after the route was registered.
/// Cloning is cheap and clones are the same middleware, which matters when a router is
/// mounted and its ancestors' middlewares are merged into it.
///
/// # Examples
///
/// ```
/// use waypost::{Callback, Next, Request, Response, Router};
///
/// let logger = Callback::new(|req: Request, _: Response, next: Next| async move {
///     println!("{} {}", req.method(), req.path());
///     next.proceed();
/// });
///
/// let router = Router::new();
/// router.middleware(logger);
/// ```
#[derive(Clone)]
pub struct Callback {
    handler: Handler,
}

impl Callback {
    pub fn new<H, R, O>(handler: H) -> Callback
    where
        H: Fn(Request, Response, Next) -> R + Send + Sync + 'static,
        R: Future<Output = O> + Send + 'static,
        O: IntoReply + 'static,
    {
        let handler: Handler = Arc::new(move |req, res, next| {
            let fut = handler(req, res, next);
            Box::new(async move { fut.await.into_reply() })
        });
        Callback { handler }
    }

    pub(crate) fn call(&self, req: Request, res: Response, next: Next) -> CallbackFuture {
        Pin::from((self.handler)(req, res, next))
    }

    pub(crate) fn same(&self, other: &Callback) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.handler) as *const (),
            Arc::as_ptr(&other.handler) as *const (),
        )
    }
}

impl Debug for Callback {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Callback {{ handler: {:p} }}", Arc::as_ptr(&self.handler) as *const ())
    }
}

/// Keeps the first occurrence of every callback.
pub(crate) fn dedup(callbacks: Vec<Callback>) -> Vec<Callback> {
    let mut unique: Vec<Callback> = Vec::with_capacity(callbacks.len());
    for callback in callbacks {
        if !unique.iter().any(|seen| seen.same(&callback)) {
            unique.push(callback);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callback {
        Callback::new(|_: Request, _: Response, next: Next| async move { next.proceed() })
    }

    #[test]
    fn should_compare_by_identity() {
        let a = noop();
        let b = noop();

        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn should_dedup_keeping_first_occurrence() {
        let a = noop();
        let b = noop();

        let unique = dedup(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(unique.len(), 2);
        assert!(unique[0].same(&a));
        assert!(unique[1].same(&b));
    }
}
