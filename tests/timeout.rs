use hyper::{Method, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};
use waypost::{Next, Request, Response, Router, RouterConfig, Timeout};

mod support;

use support::{get, into_text, request};

#[tokio::test(start_paused = true)]
async fn can_time_out_a_pending_callback() {
    let app = Router::new();
    app.set_timeout(Duration::from_millis(1000))
        .get("/stuck", |_: Request, _: Response, _: Next| async move {});

    let dispatcher = app.build().unwrap();
    let started = Instant::now();
    let (status, body) = get(&dispatcher, "/stuck").await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, "Request timeout");
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(1100));
}

#[tokio::test(start_paused = true)]
async fn can_wait_forever_when_disabled() {
    let (tx, rx) = oneshot::channel::<Response>();
    let tx = Arc::new(Mutex::new(Some(tx)));

    let app = Router::with_config(RouterConfig {
        timeout: Timeout::Disabled,
        ..RouterConfig::default()
    });
    app.get("/later", move |_: Request, res: Response, _: Next| {
        let tx = tx.clone();
        async move {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(res);
            }
        }
    });

    let dispatcher = Arc::new(app.build().unwrap());
    let pending = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch(request(Method::GET, "/later")).await })
    };

    let res = rx.await.unwrap();
    sleep(Duration::from_secs(3600)).await;
    assert!(!pending.is_finished());

    assert!(res.text("finally"));
    let resp = pending.await.unwrap().unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(into_text(resp.into_body()).await, "finally");
}

#[tokio::test(start_paused = true)]
async fn can_leave_timed_out_callbacks_running() {
    let finished = Arc::new(AtomicBool::new(false));
    let late_send = Arc::new(AtomicBool::new(true));

    let app = Router::new();
    app.set_timeout(Duration::from_millis(1000)).get("/slow", {
        let finished = finished.clone();
        let late_send = late_send.clone();
        move |_: Request, res: Response, _: Next| {
            let finished = finished.clone();
            let late_send = late_send.clone();
            async move {
                sleep(Duration::from_millis(1500)).await;
                late_send.store(res.text("too late"), Ordering::SeqCst);
                finished.store(true, Ordering::SeqCst);
            }
        }
    });

    let dispatcher = app.build().unwrap();
    let (status, _) = get(&dispatcher, "/slow").await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert!(!finished.load(Ordering::SeqCst));

    sleep(Duration::from_millis(1000)).await;
    assert!(finished.load(Ordering::SeqCst));
    assert!(!late_send.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn can_compute_timeouts_per_request() {
    let app = Router::new();
    app.set_timeout(Timeout::per_request(|req: &Request| {
        if req.header("x-patient").is_some() {
            Duration::from_secs(5)
        } else {
            Duration::from_secs(1)
        }
    }))
    .get("/work", |_: Request, res: Response, _: Next| async move {
        sleep(Duration::from_secs(2)).await;
        res.text("done");
    });

    let dispatcher = app.build().unwrap();

    assert_eq!(get(&dispatcher, "/work").await.0, StatusCode::REQUEST_TIMEOUT);

    let req = hyper::Request::builder()
        .uri("/work")
        .header("x-patient", "1")
        .body(hyper::body::Bytes::new())
        .unwrap();
    let resp = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(into_text(resp.into_body()).await, "done");
}

#[tokio::test(start_paused = true)]
async fn can_use_the_owning_routers_timeout() {
    let slow = Router::new();
    slow.set_timeout(Duration::from_secs(10))
        .get("/", |_: Request, res: Response, _: Next| async move {
            sleep(Duration::from_secs(5)).await;
            res.text("slow but fine");
        });

    let app = Router::new();
    app.set_timeout(Duration::from_secs(1))
        .get("/", |_: Request, res: Response, _: Next| async move {
            sleep(Duration::from_secs(5)).await;
            res.text("never");
        })
        .scope("/slow", &slow);

    let dispatcher = app.build().unwrap();

    assert_eq!(get(&dispatcher, "/").await.0, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(get(&dispatcher, "/slow").await.1, "slow but fine");
}

#[tokio::test(start_paused = true)]
async fn can_share_one_deadline_across_the_chain() {
    let app = Router::new();
    app.set_timeout(Duration::from_millis(1000)).route(
        &[Method::GET],
        "/steps",
        vec![
            waypost::Callback::new(|_: Request, _: Response, next: Next| async move {
                sleep(Duration::from_millis(600)).await;
                next.proceed();
            }),
            waypost::Callback::new(|_: Request, res: Response, _: Next| async move {
                sleep(Duration::from_millis(600)).await;
                res.text("done");
            }),
        ],
    );

    let dispatcher = app.build().unwrap();

    assert_eq!(get(&dispatcher, "/steps").await.0, StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn can_treat_unrepresentable_deadlines_as_none() {
    let app = Router::new();
    app.set_timeout(Duration::MAX)
        .get("/", |_: Request, res: Response, _: Next| async move {
            sleep(Duration::from_secs(3600)).await;
            res.text("eventually");
        });

    let dispatcher = app.build().unwrap();
    assert_eq!(get(&dispatcher, "/").await, (StatusCode::OK, "eventually".to_owned()));

    let app = Router::new();
    app.set_timeout(Timeout::per_request(|req: &Request| match req.header("x-timeout-secs") {
        Some(secs) => Duration::from_secs(secs.parse().unwrap_or(1)),
        None => Duration::from_secs(1),
    }))
    .get("/", |_: Request, res: Response, _: Next| async move {
        sleep(Duration::from_secs(2)).await;
        res.text("done");
    });

    let dispatcher = app.build().unwrap();
    let req = hyper::Request::builder()
        .uri("/")
        .header("x-timeout-secs", u64::MAX.to_string())
        .body(hyper::body::Bytes::new())
        .unwrap();
    let resp = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(into_text(resp.into_body()).await, "done");
}
