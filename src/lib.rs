//! `waypost` is an embeddable HTTP router for [hyper](https://hyper.rs/) built around a path trie,
//! mountable sub-routers, continuation-style middleware chains, per-request timeouts and error
//! handlers that bubble from the innermost router up to the root.
//!
//! ## Basic example
//!
//! ```no_run
//! use hyper::service::Service;
//! use hyper_util::rt::{TokioExecutor, TokioIo};
//! use hyper_util::server::conn::auto::Builder;
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use waypost::{Next, Request, Response, Router, RouterService};
//!
//! async fn home(_: Request, res: Response, _: Next) {
//!     res.text("Home page");
//! }
//!
//! async fn user(req: Request, res: Response, _: Next) {
//!     let user_id = req.param("userId").unwrap();
//!     res.text(format!("Hello {}", user_id));
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let router = Router::new();
//!     router.get("/", home).get("/users/:userId", user);
//!
//!     let service = Arc::new(RouterService::new(&router)?);
//!     let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 3001))).await?;
//!
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let service = service.clone();
//!         tokio::spawn(async move {
//!             let request_service = service.call(&stream).await.unwrap();
//!             let builder = Builder::new(TokioExecutor::new());
//!             let _ = builder.serve_connection(TokioIo::new(stream), request_service).await;
//!         });
//!     }
//! }
//! ```
//!
//! ## Routing
//!
//! Route paths are made of `/`-separated segments:
//!
//! - literals, e.g. `/users`, matched exactly against the percent-decoded request segment;
//! - parameters, e.g. `/users/:userId`, available through [`Request::param`];
//! - wildcards, e.g. `/files/*` or `/files/img*`, which match the rest of the path. A wildcard
//!   with a literal prefix only applies to segments starting with that prefix; the longest
//!   matching prefix wins.
//!
//! Literals are tried before parameters, and wildcards are the fallback when nothing more
//! specific matches. A path that exists for other methods only is answered with
//! `405 Method Not Allowed` rather than `404 Not Found`.
//!
//! Parameter and query values are decoded into a [`ParamValue`]: unsigned decimals become
//! numbers, `true`/`false` become booleans, anything else is a percent-decoded string.
//!
//! ## Middlewares and the `Next` continuation
//!
//! Callbacks take the request, the response and a [`Next`] token. A callback moves the
//! pipeline on with [`Next::proceed`], raises an error with [`Next::fail`] (or by returning
//! `Err`), or ends it by sending a response. A callback that does none of these holds the
//! request until the router's [`Timeout`] expires.
//!
//! ```
//! use waypost::{Callback, Next, Request, Response, Router};
//!
//! #[derive(Clone)]
//! struct User(String);
//!
//! let auth = Callback::new(|req: Request, _: Response, next: Next| async move {
//!     match req.header("x-user") {
//!         Some(name) => {
//!             req.set_data(User(name.to_owned()));
//!             next.proceed();
//!         }
//!         None => next.fail("unauthenticated"),
//!     }
//! });
//!
//! let admin = Router::new();
//! admin.get("/", |req: Request, res: Response, _: Next| async move {
//!     let user = req.data::<User>().unwrap();
//!     res.text(format!("welcome {}", user.0));
//! });
//!
//! let app = Router::new();
//! app.scope_with("/admin", vec![auth], &admin);
//! ```
//!
//! Mounting a router with [`Router::scope`] puts the middlewares of its new ancestors in
//! front of its own, for the routes it already has and for those registered later.
//! [`Router::middleware`] appends a middleware to a router and to everything mounted under it.
//!
//! ## Error handling
//!
//! Routing failures ([`RoutingError`]) and errors raised by callbacks go to the error handlers
//! of the router owning the request, then of its ancestors, innermost first. Routers without
//! a handler of their own are skipped, except the root which falls back to a built-in handler
//! mapping each [`RoutingError`] to its status code. A handler passes a different error on to
//! the next one with [`Next::fail`].

pub use self::config::RouterConfig;
pub use self::dispatch::Dispatcher;
pub use self::error::{Error, RouteError, RoutingError, SharedError};
pub use self::middleware::{Callback, IntoReply, Next, Reply};
pub use self::request::Request;
pub use self::response::Response;
pub use self::router::Router;
pub use self::service::{RequestService, RequestServiceBuilder, RouterService};
pub use self::timeout::Timeout;
pub use self::types::{ParamValue, RouteParams};

mod config;
mod constants;
mod dispatch;
mod error;
mod helpers;
mod middleware;
mod path;
mod request;
mod response;
mod route;
mod router;
mod service;
mod timeout;
mod trie;
mod types;

/// A Result type often returned from methods that can have `waypost` errors.
pub type Result<T> = std::result::Result<T, Error>;
