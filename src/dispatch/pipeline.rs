use super::{error_chain, Dispatcher, RouterId};
use crate::middleware::{Callback, Next, Reply, StepSignal};
use crate::route::RouteRecord;
use crate::{Request, Response, RouteError, RoutingError, SharedError};
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio::time::{sleep_until, Instant, Sleep};
use tracing::{trace, warn};

enum Step {
    Settled { proceed: bool },
    Failed(RouteError),
    TimedOut,
}

enum Outcome {
    Sent,
    Failed(SharedError),
    Exhausted,
}

/// Runs the callback chain of a matched route, then hands any failure to the error chain.
pub(crate) async fn run(
    dispatcher: &Dispatcher,
    record: &RouteRecord,
    owner: RouterId,
    req: &Request,
    res: &Response,
    started: Instant,
) {
    let entry = dispatcher.router(owner);
    let chain = if record.callbacks.is_empty() {
        entry.middlewares.clone()
    } else {
        record.chain()
    };

    // One timer for the whole request. It is dropped before the error handlers run.
    let mut timer = entry
        .timeout
        .deadline(req, started)
        .map(|deadline| Box::pin(sleep_until(deadline)));
    let outcome = execute(
        &chain,
        req,
        res,
        timer.as_mut().map(|timer| timer.as_mut()),
        dispatcher.treat_return_as_response(),
    )
    .await;
    drop(timer);

    let err: SharedError = match outcome {
        Outcome::Sent => return,
        Outcome::Failed(err) => err,
        Outcome::Exhausted if record.callbacks.is_empty() => Arc::new(RoutingError::NotFound),
        Outcome::Exhausted => Arc::new(RoutingError::NoResponse(req.path().to_owned())),
    };

    error_chain::resolve(dispatcher, owner, err, req, res).await;
}

async fn execute(
    chain: &[Callback],
    req: &Request,
    res: &Response,
    mut timer: Option<Pin<&mut Sleep>>,
    treat_return: bool,
) -> Outcome {
    for (idx, callback) in chain.iter().enumerate() {
        trace!(step = idx, path = req.path(), "running callback");

        let step = run_step(
            callback,
            req,
            res,
            timer.as_mut().map(|timer| timer.as_mut()),
            treat_return,
        )
        .await;

        match step {
            Step::Failed(err) => return Outcome::Failed(SharedError::from(err)),
            Step::TimedOut => {
                warn!(method = %req.method(), path = req.path(), step = idx, "request timed out");
                return Outcome::Failed(Arc::new(RoutingError::Timeout));
            }
            Step::Settled { proceed } => {
                if res.is_sent() {
                    return Outcome::Sent;
                }
                if !proceed {
                    break;
                }
            }
        }
    }

    Outcome::Exhausted
}

/// Runs one callback until its future has completed and the step is settled, or until
/// the timer fires.
async fn run_step(
    callback: &Callback,
    req: &Request,
    res: &Response,
    timer: Option<Pin<&mut Sleep>>,
    treat_return: bool,
) -> Step {
    let signal = StepSignal::new();
    res.bind_step(signal.clone());

    // Detached: a callback still running at the deadline is left to finish on its own.
    let task = tokio::spawn(callback.call(req.clone(), res.clone(), Next::new(signal.clone())));

    let completion = async {
        let reply = match task.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => return Step::Failed(err),
            Err(err) => return Step::Failed(Box::new(RoutingError::Panicked(panic_message(err)))),
        };

        if treat_return && !res.is_sent() {
            if let Err(err) = send_reply(reply, res) {
                return Step::Failed(err);
            }
        }

        signal.wait().await;
        match signal.outcome() {
            (_, Some(err)) => Step::Failed(err),
            (proceed, None) => Step::Settled { proceed },
        }
    };

    match timer {
        Some(timer) => tokio::select! {
            biased;
            step = completion => step,
            _ = timer => Step::TimedOut,
        },
        None => completion.await,
    }
}

fn send_reply(reply: Reply, res: &Response) -> Result<(), RouteError> {
    match reply {
        Reply::Empty => {}
        Reply::Text(text) => {
            res.text(text);
        }
        Reply::Bytes(bytes) => {
            res.send(bytes);
        }
        Reply::Json(value) => {
            res.json(&value)
                .map_err(|err| RoutingError::InvalidReturnType(err.to_string()))?;
        }
        Reply::Unsupported(kind) => return Err(Box::new(RoutingError::InvalidReturnType(kind))),
    }
    Ok(())
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }

    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
