use crate::types::{ParamValue, RouteParams};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Uri};
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

struct RequestInner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    params: RwLock<RouteParams>,
    query: RwLock<RouteParams>,
    data: Mutex<http::Extensions>,
}

/// The incoming request as seen by callbacks and error handlers.
///
/// The body is already collected. Path parameters, the parsed query string and the
/// request-scoped data bag can be read and written by every step of the pipeline; clones
/// share them.
#[derive(Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Request {
        Request {
            inner: Arc::new(RequestInner {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
                remote_addr,
                params: RwLock::new(RouteParams::new()),
                query: RwLock::new(RouteParams::new()),
                data: Mutex::new(http::Extensions::new()),
            }),
        }
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// The raw, still percent-encoded, request path.
    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Looks up a header, ignoring values that are not visible ASCII.
    pub fn header<K: AsRef<str>>(&self, name: K) -> Option<&str> {
        self.inner.headers.get(name.as_ref()).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// The peer address. Unknown when the request was dispatched without a connection.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    pub fn param<N: AsRef<str>>(&self, name: N) -> Option<ParamValue> {
        self.inner
            .params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn params(&self) -> RouteParams {
        self.inner.params.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_param<N: Into<String>, V: Into<ParamValue>>(&self, name: N, value: V) {
        self.inner
            .params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(name, value);
    }

    pub fn query<N: AsRef<str>>(&self, name: N) -> Option<ParamValue> {
        self.inner
            .query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn query_params(&self) -> RouteParams {
        self.inner.query.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stores a value in the request-scoped data bag, replacing any value of the same type.
    pub fn set_data<T: Clone + Send + Sync + 'static>(&self, value: T) {
        self.lock_data().insert(value);
    }

    pub fn data<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.lock_data().get::<T>().cloned()
    }

    /// Mutates a stored value in place. Returns `false` when no value of that type is stored.
    pub fn update_data<T, F>(&self, f: F) -> bool
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        match self.lock_data().get_mut::<T>() {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_params(&self, params: RouteParams) {
        *self.inner.params.write().unwrap_or_else(PoisonError::into_inner) = params;
    }

    pub(crate) fn set_query(&self, query: RouteParams) {
        *self.inner.query.write().unwrap_or_else(PoisonError::into_inner) = query;
    }

    fn lock_data(&self) -> std::sync::MutexGuard<'_, http::Extensions> {
        self.inner.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("remote_addr", &self.inner.remote_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        let (parts, _) = http::Request::builder()
            .uri(uri)
            .header("x-token", "abc")
            .body(())
            .unwrap()
            .into_parts();
        Request::from_parts(parts, Bytes::from_static(b"payload"), None)
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Visits(u32);

    #[test]
    fn should_share_data_between_clones() {
        let req = request("/a");
        let clone = req.clone();

        req.set_data(Visits(1));
        assert!(clone.update_data(|visits: &mut Visits| visits.0 += 1));
        assert_eq!(req.data::<Visits>(), Some(Visits(2)));
        assert!(!req.update_data(|_: &mut String| {}));
    }

    #[test]
    fn should_expose_request_parts() {
        let req = request("/a/b?x=1");
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.header("x-token"), Some("abc"));
        assert_eq!(req.body().as_ref(), b"payload");

        req.set_param("id", 5.0);
        assert_eq!(req.param("id"), Some(ParamValue::Number(5.0)));
        assert!(req.query("x").is_none());
    }
}
