use crate::middleware::{IntoReply, Next};
use crate::{Request, Response, RouteError, RoutingError, SharedError};
use hyper::StatusCode;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::error;

type Handler = Arc<dyn Fn(SharedError, Request, Response, Next) -> HandlerReturn + Send + Sync + 'static>;
type HandlerReturn = Box<dyn Future<Output = Result<(), RouteError>> + Send + 'static>;

/// A router's error handler.
///
/// Returning `Err` or calling [`Next::fail`] hands a replacement error to the next
/// handler of the chain.
#[derive(Clone)]
pub(crate) struct ErrorHandler {
    handler: Handler,
}

impl ErrorHandler {
    pub(crate) fn new<H, R, O>(handler: H) -> ErrorHandler
    where
        H: Fn(SharedError, Request, Response, Next) -> R + Send + Sync + 'static,
        R: Future<Output = O> + Send + 'static,
        O: IntoReply + 'static,
    {
        let handler: Handler = Arc::new(move |err, req, res, next| {
            let fut = handler(err, req, res, next);
            Box::new(async move { fut.await.into_reply().map(|_| ()) })
        });
        ErrorHandler { handler }
    }

    /// The handler used by a root router that has none of its own.
    pub(crate) fn fallback(development: bool) -> ErrorHandler {
        ErrorHandler::new(move |err: SharedError, _: Request, res: Response, _: Next| async move {
            default_error_handler(err, res, development);
        })
    }

    pub(crate) fn call(&self, err: SharedError, req: Request, res: Response, next: Next) -> Pin<HandlerReturn> {
        Pin::from((self.handler)(err, req, res, next))
    }
}

impl Debug for ErrorHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorHandler")
    }
}

fn default_error_handler(err: SharedError, res: Response, development: bool) {
    if let Some(kind) = RoutingError::find(err.as_ref()) {
        let message = match kind {
            RoutingError::NotFound => Some("Not found"),
            RoutingError::MalformedBody(_) => Some("Malformed request body"),
            RoutingError::Timeout => Some("Request timeout"),
            RoutingError::MethodNotAllowed => Some("Method not allowed"),
            _ => None,
        };
        if let Some(message) = message {
            res.status(kind.status()).text(message);
            return;
        }
    }

    error!(error = %err, "unhandled error while serving request");
    let body = if development {
        format!("{:?}", err)
    } else {
        "Server Error".to_owned()
    };
    res.status(StatusCode::INTERNAL_SERVER_ERROR).text(body);
}
