use hyper::service::Service;
use hyper::StatusCode;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use waypost::{Callback, Next, Request, Response, Router, RouterConfig, RouterService, RoutingError, SharedError};

#[derive(Serialize)]
struct Post {
    user: String,
    id: f64,
}

async fn home(_: Request, res: Response, _: Next) {
    res.text("Home page");
}

async fn user_posts(req: Request, _: Response, _: Next) -> serde_json::Value {
    let user = req.param("userId").map(|v| v.to_string()).unwrap_or_default();
    let posts: Vec<Post> = (1..=3)
        .map(|id| Post {
            user: user.clone(),
            id: id as f64,
        })
        .collect();
    serde_json::json!({ "posts": posts, "page": req.query("page") })
}

async fn user_post(req: Request, _: Response, _: Next) -> waypost::Reply {
    waypost::Reply::json(&Post {
        user: req.param("userId").map(|v| v.to_string()).unwrap_or_default(),
        id: req.param("postId").and_then(|v| v.as_f64()).unwrap_or_default(),
    })
}

// Never answers, so the router's timeout kicks in.
async fn slow(_: Request, _: Response, _: Next) {}

async fn api_error_handler(err: SharedError, _: Request, res: Response, _: Next) {
    // Routing failures go on to the root handler.
    if RoutingError::find(err.as_ref()).is_some() {
        return;
    }
    let _ = res
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .json(&serde_json::json!({ "error": err.to_string() }));
}

fn router() -> Router {
    let logger = Callback::new(|req: Request, _: Response, next: Next| async move {
        info!(method = %req.method(), path = req.path(), remote = ?req.remote_addr(), "request");
        next.proceed();
    });

    let users = Router::new();
    users
        .get("/:userId/posts", user_posts)
        .get("/:userId/posts/:postId", user_post)
        .get("/slow", slow)
        .set_timeout(Duration::from_secs(2));

    let api = Router::new();
    api.err_handler(api_error_handler).scope("/users", &users);

    let app = Router::with_config(RouterConfig::from_env());
    app.set_treat_return_as_response(true)
        .middleware(logger)
        .get("/", home)
        .scope("/api", &api);
    app
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let router = router();

    let service = match RouterService::new(&router) {
        Ok(service) => Arc::new(service),
        Err(err) => {
            error!(error = %err, "invalid router");
            return;
        }
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "couldn't bind");
            return;
        }
    };
    info!(%addr, "app is running");

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let service = Arc::clone(&service);

                tokio::task::spawn(async move {
                    let request_service = match service.call(&stream).await {
                        Ok(request_service) => request_service,
                        Err(err) => match err {},
                    };
                    let builder = Builder::new(TokioExecutor::new());
                    if let Err(err) = builder.serve_connection(TokioIo::new(stream), request_service).await {
                        error!(error = %err, "error serving connection");
                    }
                });
            }
            Err(err) => {
                error!(error = %err, "error accepting connection");
            }
        }
    }
}
