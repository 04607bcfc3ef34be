use super::{Dispatcher, RouterId};
use crate::middleware::{Next, StepSignal};
use crate::{Request, Response, SharedError};
use tracing::debug;

/// Runs the error handlers of `owner` and its ancestors, innermost first, until one of
/// them sends a response.
///
/// A handler that fails, or calls `Next::fail`, replaces the error seen by the handlers
/// after it.
pub(crate) async fn resolve(
    dispatcher: &Dispatcher,
    owner: RouterId,
    mut err: SharedError,
    req: &Request,
    res: &Response,
) {
    for handler in dispatcher.error_handlers(owner) {
        let signal = StepSignal::new();
        res.bind_step(signal.clone());

        let returned = handler
            .call(err.clone(), req.clone(), res.clone(), Next::new(signal.clone()))
            .await;

        if res.is_sent() {
            return;
        }

        let replacement = match returned {
            Err(replacement) => Some(replacement),
            Ok(()) => signal.outcome().1,
        };
        if let Some(replacement) = replacement {
            debug!(original = %err, replacement = %replacement, "error replaced by error handler");
            err = SharedError::from(replacement);
        }
    }
}
