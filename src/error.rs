use hyper::StatusCode;
use std::sync::Arc;
use thiserror::Error as ThisError;

/// The error type returned by route callbacks and middlewares, and passed to [`Next::fail`](crate::Next::fail).
///
/// Any error type works; the concrete error can be recovered in an error handler with `downcast_ref`.
pub type RouteError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error value handed to error handlers.
///
/// It is shared because the same error travels through every handler of the error chain
/// until one of them replaces it or sends a response.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by `waypost` itself while registering routes or serving a request.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("invalid route path `{path}`: {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("the router mounted at `{path}` is already mounted under another router")]
    AlreadyMounted { path: String },

    #[error("mounting a router at `{path}` would create a cycle")]
    MountCycle { path: String },

    #[error("a router is already mounted at `{path}`")]
    PathAlreadyMounted { path: String },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("couldn't serialize the response body as json: {0}")]
    Json(String),

    #[error("couldn't read the request body: {0}")]
    Body(String),

    #[error("no response was produced for `{path}`")]
    Unanswered { path: String },
}

/// The routing failures funneled through the error handler chain.
///
/// The built-in error handler maps each kind to a status code with [`RoutingError::status`].
#[derive(Debug, ThisError)]
pub enum RoutingError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request timeout")]
    Timeout,

    #[error("route `{0}` does not return any response")]
    NoResponse(String),

    /// Raised by body parsers and other request decoders living outside the router.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("returned data type not supported: {0}")]
    InvalidReturnType(String),

    #[error("a callback panicked: {0}")]
    Panicked(String),
}

impl RoutingError {
    pub fn status(&self) -> StatusCode {
        match self {
            RoutingError::NotFound => StatusCode::NOT_FOUND,
            RoutingError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            RoutingError::Timeout => StatusCode::REQUEST_TIMEOUT,
            RoutingError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Finds a `RoutingError` behind a type-erased error.
    pub fn find<'a>(err: &'a (dyn std::error::Error + Send + Sync + 'static)) -> Option<&'a RoutingError> {
        err.downcast_ref::<RoutingError>()
    }
}
