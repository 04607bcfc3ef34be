use crate::middleware::StepSignal;
use crate::{Error, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::StatusCode;
use serde::Serialize;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct ResponseState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    sent: bool,
    output: Option<hyper::Response<Full<Bytes>>>,
    step: Option<Arc<StepSignal>>,
}

/// The outgoing response shared by every step of a request pipeline.
///
/// Status and headers are staged until the first [`send`](Response::send), which snapshots
/// them together with the body. Later sends are ignored. Sending also settles the current
/// pipeline step, so a callback that sends doesn't need to call [`Next`](crate::Next).
#[derive(Clone, Default)]
pub struct Response {
    inner: Arc<Mutex<ResponseState>>,
}

impl Response {
    pub(crate) fn new() -> Response {
        Response::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self, status: StatusCode) -> &Self {
        self.lock().status = Some(status);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.lock().status.unwrap_or(StatusCode::OK)
    }

    pub fn set_header<K, V>(&self, key: K, value: V) -> Result<&Self>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let key = HeaderName::try_from(key).map_err(|e| invalid_header(e.into()))?;
        let value = HeaderValue::try_from(value).map_err(|e| invalid_header(e.into()))?;
        self.lock().headers.insert(key, value);
        Ok(self)
    }

    pub fn set_headers<I, K, V>(&self, headers: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        for (key, value) in headers {
            self.set_header(key, value)?;
        }
        Ok(self)
    }

    pub fn header<K: AsRef<str>>(&self, key: K) -> Option<String> {
        self.lock()
            .headers
            .get(key.as_ref())
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    /// Sends the response. Returns `false` when a response was already sent.
    pub fn send<B: Into<Bytes>>(&self, body: B) -> bool {
        let (sent_now, step) = {
            let mut state = self.lock();
            let sent_now = !state.sent;
            if sent_now {
                let mut resp = hyper::Response::new(Full::new(body.into()));
                *resp.status_mut() = state.status.unwrap_or(StatusCode::OK);
                *resp.headers_mut() = state.headers.clone();
                state.output = Some(resp);
                state.sent = true;
            }
            (sent_now, state.step.clone())
        };

        if let Some(step) = step {
            step.settle();
        }
        sent_now
    }

    /// Sends a text body, defaulting the content type to `text/plain`.
    pub fn text<T: Into<String>>(&self, body: T) -> bool {
        self.default_content_type("text/plain; charset=utf-8");
        self.send(body.into())
    }

    /// Serializes `value` and sends it with an `application/json` content type unless one was set.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        let body = serde_json::to_vec(value).map_err(|e| Error::Json(e.to_string()))?;
        self.default_content_type("application/json");
        Ok(self.send(body))
    }

    /// Sends an empty body.
    pub fn end(&self) -> bool {
        self.send(Bytes::new())
    }

    /// Redirects to `location` with `302 Found`, or with the status set beforehand.
    pub fn redirect<L>(&self, location: L) -> Result<bool>
    where
        HeaderValue: TryFrom<L>,
        <HeaderValue as TryFrom<L>>::Error: Into<http::Error>,
    {
        {
            let mut state = self.lock();
            if state.status.is_none() {
                state.status = Some(StatusCode::FOUND);
            }
        }
        self.set_header(header::LOCATION, location)?;
        Ok(self.end())
    }

    pub fn is_sent(&self) -> bool {
        self.lock().sent
    }

    pub(crate) fn bind_step(&self, step: Arc<StepSignal>) {
        self.lock().step = Some(step);
    }

    pub(crate) fn take_http(&self) -> Option<hyper::Response<Full<Bytes>>> {
        self.lock().output.take()
    }

    fn default_content_type(&self, content_type: &'static str) {
        self.lock()
            .headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(content_type));
    }
}

fn invalid_header(err: http::Error) -> Error {
    Error::InvalidHeader(err.to_string())
}

impl Debug for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Response")
            .field("status", &state.status)
            .field("headers", &state.headers)
            .field("sent", &state.sent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(res: &Response) -> String {
        let resp = res.take_http().unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_send_only_once() {
        let res = Response::new();
        let step = StepSignal::new();
        res.bind_step(step.clone());

        res.status(StatusCode::CREATED);
        assert!(res.text("first"));
        assert!(!res.text("second"));
        res.status(StatusCode::BAD_REQUEST);

        step.wait().await;
        assert!(res.is_sent());
        let resp_status = res.lock().output.as_ref().map(|r| r.status());
        assert_eq!(resp_status, Some(StatusCode::CREATED));
        assert_eq!(body_of(&res).await, "first");
    }

    #[tokio::test]
    async fn should_send_json() {
        let res = Response::new();
        res.json(&serde_json::json!({ "ok": true })).unwrap();

        assert_eq!(res.header("content-type").as_deref(), Some("application/json"));
        assert_eq!(body_of(&res).await, r#"{"ok":true}"#);
    }

    #[test]
    fn should_redirect_with_found_by_default() {
        let res = Response::new();
        res.redirect("/login").unwrap();

        let resp = res.take_http().unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/login");
    }

    #[test]
    fn should_reject_invalid_headers() {
        let res = Response::new();
        assert!(matches!(res.set_header("bad header", "x"), Err(Error::InvalidHeader(_))));
        res.set_headers([("x-a", "1"), ("x-b", "2")]).unwrap();
        assert_eq!(res.header("x-b").as_deref(), Some("2"));
    }
}
