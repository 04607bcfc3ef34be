#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot::{self, Sender};
use waypost::{Dispatcher, Router, RouterService};

pub struct Serve {
    addr: SocketAddr,
    tx: Sender<()>,
}

impl Serve {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn new_request(&self, method: &str, route: &str) -> http::request::Builder {
        http::Request::builder()
            .method(method.to_ascii_uppercase().as_str())
            .uri(format!("http://{}{}", self.addr(), route))
    }

    pub fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

/// Serves `router` on an ephemeral local port until the returned handle is shut down.
pub async fn serve(router: &Router) -> Serve {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router_service = Arc::new(RouterService::new(router).unwrap());
    let (tx, mut rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        loop {
            let (stream, _) = tokio::select! {
                accepted = listener.accept() => accepted.unwrap(),
                _ = &mut rx => break,
            };
            let router_service = router_service.clone();

            tokio::spawn(async move {
                let request_service = router_service.call(&stream).await.unwrap();
                let builder = Builder::new(TokioExecutor::new());
                let _ = builder.serve_connection(TokioIo::new(stream), request_service).await;
            });
        }
    });

    Serve { addr, tx }
}

pub fn client() -> Client<HttpConnector, Full<Bytes>> {
    Client::builder(TokioExecutor::new()).build_http()
}

pub async fn into_text<B>(body: B) -> String
where
    B: hyper::body::Body<Data = Bytes> + Send,
    B::Error: std::fmt::Debug,
{
    String::from_utf8_lossy(&body.collect().await.unwrap().to_bytes()).to_string()
}

pub fn request(method: Method, uri: &str) -> hyper::Request<Bytes> {
    hyper::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// Dispatches a bodyless request without a socket, returning the status and body text.
pub async fn dispatch(dispatcher: &Dispatcher, method: Method, uri: &str) -> (StatusCode, String) {
    let resp = dispatcher.dispatch(request(method, uri)).await.unwrap();
    let status = resp.status();
    (status, into_text(resp.into_body()).await)
}

pub async fn get(dispatcher: &Dispatcher, uri: &str) -> (StatusCode, String) {
    dispatch(dispatcher, Method::GET, uri).await
}
