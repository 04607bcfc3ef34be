use crate::RouteError;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

#[derive(Default)]
struct StepState {
    proceed: bool,
    error: Option<RouteError>,
}

/// The settle signal of one pipeline step.
///
/// A step is settled by [`Next`] or by sending the response. The executor waits for it
/// after the callback's own future has completed.
pub(crate) struct StepSignal {
    state: Mutex<StepState>,
    settled: watch::Sender<bool>,
}

impl StepSignal {
    pub(crate) fn new() -> Arc<StepSignal> {
        let (settled, _) = watch::channel(false);
        Arc::new(StepSignal {
            state: Mutex::new(StepState::default()),
            settled,
        })
    }

    pub(crate) fn settle(&self) {
        self.settled.send_replace(true);
    }

    pub(crate) async fn wait(&self) {
        let mut rx = self.settled.subscribe();
        // The sender lives as long as `self`, so this never fails.
        let _ = rx.wait_for(|settled| *settled).await;
    }

    /// Returns whether the chain may continue and the error raised through `Next::fail`, if any.
    pub(crate) fn outcome(&self) -> (bool, Option<RouteError>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        (state.proceed, state.error.take())
    }

    fn update<F: FnOnce(&mut StepState)>(&self, f: F) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut state);
        }
        self.settle();
    }
}

/// The continuation handed to every callback and error handler.
///
/// A callback must either send a response or call one of these methods, otherwise its
/// step stays pending until the request times out.
///
/// # Examples
///
/// ```
/// use waypost::{Callback, Next, Request, Response};
///
/// let auth = Callback::new(|req: Request, _res: Response, next: Next| async move {
///     if req.header("authorization").is_some() {
///         next.proceed();
///     } else {
///         next.fail("missing credentials");
///     }
/// });
/// # drop(auth);
/// ```
#[derive(Clone)]
pub struct Next {
    step: Arc<StepSignal>,
}

impl Next {
    pub(crate) fn new(step: Arc<StepSignal>) -> Next {
        Next { step }
    }

    /// Lets the pipeline move on to the next callback.
    pub fn proceed(&self) {
        self.step.update(|state| state.proceed = true);
    }

    /// Raises an error. Inside an error handler it replaces the error handed to the next handler.
    pub fn fail<E: Into<RouteError>>(&self, err: E) {
        let err = err.into();
        self.step.update(move |state| state.error = Some(err));
    }

    /// Settles the step without continuing. The chain stops here.
    pub fn halt(&self) {
        self.step.settle();
    }
}

impl Debug for Next {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Next {{ settled: {} }}", *self.step.settled.borrow())
    }
}
