use crate::{Dispatcher, Error, RouteError, Router};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{service::Service, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// Serves the requests of one connection.
pub struct RequestService {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) remote_addr: SocketAddr,
}

impl<T> Service<Request<T>> for RequestService
where
    T: Body + Send + 'static,
    T::Data: Send,
    T::Error: Into<RouteError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = RouteError;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<T>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let remote_addr = self.remote_addr;

        let fut = async move {
            let (parts, body) = req.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::Body(Into::<RouteError>::into(e).to_string()))?
                .to_bytes();

            let resp = dispatcher
                .dispatch_from(Request::from_parts(parts, body), Some(remote_addr))
                .await?;
            Ok::<_, RouteError>(resp)
        };

        Box::pin(fut)
    }
}

/// Builds a [`RequestService`] for every new connection, sharing one compiled router.
#[derive(Debug, Clone)]
pub struct RequestServiceBuilder {
    dispatcher: Arc<Dispatcher>,
}

impl RequestServiceBuilder {
    pub fn new(router: &Router) -> crate::Result<Self> {
        Ok(Self::from_dispatcher(router.build()?))
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn build(&self, remote_addr: SocketAddr) -> RequestService {
        RequestService {
            dispatcher: self.dispatcher.clone(),
            remote_addr,
        }
    }
}
