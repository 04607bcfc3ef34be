use crate::service::request_service::{RequestService, RequestServiceBuilder};
use crate::{Dispatcher, Router};
use hyper::service::Service;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// A [`Service`](hyper::service::Service) producing a [`RequestService`] for each accepted connection.
///
/// The router is compiled once; every connection shares the same [`Dispatcher`].
///
/// # Examples
///
/// ```no_run
/// # use hyper::service::Service;
/// # use waypost::{Next, Request, Response, Router, RouterService};
/// # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let router = Router::new();
/// router.get("/", |_: Request, res: Response, _: Next| async move {
///     res.text("Home page");
/// });
///
/// let service = RouterService::new(&router)?;
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
/// let (stream, peer) = listener.accept().await?;
///
/// // The request service knows the peer address of its connection.
/// let request_service = service.call(&stream).await?;
/// # drop((request_service, peer));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RouterService {
    builder: RequestServiceBuilder,
}

impl RouterService {
    /// Compiles `router` and wraps it in a connection service.
    pub fn new(router: &Router) -> crate::Result<RouterService> {
        let builder = RequestServiceBuilder::new(router)?;
        Ok(RouterService { builder })
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> RouterService {
        RouterService {
            builder: RequestServiceBuilder::from_dispatcher(dispatcher),
        }
    }
}

impl Service<&TcpStream> for RouterService {
    type Response = RequestService;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, conn: &TcpStream) -> Self::Future {
        let addr = conn
            .peer_addr()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));
        ready(Ok(self.builder.build(addr)))
    }
}
