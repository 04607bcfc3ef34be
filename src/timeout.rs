use crate::constants::DEFAULT_TIMEOUT;
use crate::Request;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long a request may run before it is answered with a timeout error.
///
/// The clock starts when dispatch begins and covers the whole pipeline, not each step.
/// When it runs out, the pending callback is left running in the background and the
/// error handlers take over. Error handlers themselves are not timed.
#[derive(Clone)]
pub enum Timeout {
    After(Duration),
    /// Computed for each request, e.g. from a header or the path.
    PerRequest(Arc<dyn Fn(&Request) -> Duration + Send + Sync + 'static>),
    /// Wait until something answers the request, however long that takes.
    Disabled,
}

impl Timeout {
    pub fn per_request<F>(f: F) -> Timeout
    where
        F: Fn(&Request) -> Duration + Send + Sync + 'static,
    {
        Timeout::PerRequest(Arc::new(f))
    }

    /// `None` when the request has no deadline, including durations too large to be
    /// added to `started`.
    pub(crate) fn deadline(&self, req: &Request, started: Instant) -> Option<Instant> {
        match self {
            Timeout::After(duration) => started.checked_add(*duration),
            Timeout::PerRequest(f) => started.checked_add(f(req)),
            Timeout::Disabled => None,
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::After(DEFAULT_TIMEOUT)
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::After(duration)
    }
}

impl Debug for Timeout {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::After(duration) => write!(f, "Timeout::After({:?})", duration),
            Timeout::PerRequest(_) => write!(f, "Timeout::PerRequest"),
            Timeout::Disabled => write!(f, "Timeout::Disabled"),
        }
    }
}
