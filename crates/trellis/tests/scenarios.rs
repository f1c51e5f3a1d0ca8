//! End-to-end dispatch scenarios through `App::handle`, plus one run over a
//! real socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use trellis::middleware::stages::{Cors, JsonBodyParser, RequestLogger, ServeStatic};
use trellis::prelude::*;

fn send(app: &App, method: HttpMethod, target: &str) -> OutboundResponse {
    app.handle(InboundRequest::new(method, target)).unwrap()
}

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    pairs
        .iter()
        .map(|(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
        .collect()
}

fn body_text(out: &OutboundResponse) -> &str {
    std::str::from_utf8(&out.body).unwrap()
}

/// Records the order in which middleware and handlers run.
#[derive(Clone, Default)]
struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[test]
fn test_route_sees_path_and_query_params() {
    let mut app = App::new();
    app.get("/items/:id", |req, res| {
        let reply = format!(
            "id={} x={}",
            req.path_param("id").unwrap_or("-"),
            req.query_param("x").unwrap_or("-")
        );
        res.send_text(reply);
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/items/7?x=1");
    assert_eq!(out.status, 200);
    assert_eq!(body_text(&out), "id=7 x=1");
}

#[test]
fn test_route_decodes_path_params() {
    let mut app = App::new();
    app.get("/users/:id", |req, res| {
        res.send_text(req.path_param("id").unwrap_or("-").to_string());
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/users/j%C3%B6rg");
    assert_eq!(out.status, 200);
    assert_eq!(body_text(&out), "jörg");

    let out = send(&app, HttpMethod::Get, "/users/a%2Fb");
    assert_eq!(out.status, 200);
    assert_eq!(body_text(&out), "a/b");
}

#[test]
fn test_unmatched_request_is_404_with_empty_body() {
    let mut app = App::new();
    app.use_fn_at("/api", |_, res| {
        res.set_header("x-api", "1");
        next()
    });
    app.get("/missing", |_, _| Ok(()));

    let out = send(&app, HttpMethod::Post, "/missing");
    assert_eq!(out.status, 404);
    assert!(out.body.is_empty());
    assert!(out.headers.get("x-api").is_none());
}

#[test]
fn test_middleware_error_discards_earlier_mutation() {
    let mut app = App::new();
    app.use_fn(|_, res| {
        res.set_status(201)
            .set_header("x-trace", "seen")
            .set_body("half done");
        Err(anyhow::anyhow!("database unavailable"))
    });
    app.get("/", |_, res| {
        res.send_text("unreachable");
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/");
    assert_eq!(out.status, 500);
    assert!(out.body.is_empty());
}

#[test]
fn test_dot_segments_are_resolved_before_routing() {
    let mut app = App::new();
    app.get("/b/c", |req, res| {
        res.send_text(req.path());
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/a/../b/./c");
    assert_eq!(out.status, 200);
    assert_eq!(body_text(&out), "/b/c");
}

#[test]
fn test_send_stops_the_chain() {
    let trace = Trace::default();
    let (first, second) = (trace.clone(), trace.clone());

    let mut app = App::new();
    app.use_fn_at("/shared", move |_, res| {
        first.push("first");
        res.send_text("from first");
        next()
    });
    app.use_fn_at("/shared", move |_, _| {
        second.push("second");
        next()
    });

    let out = send(&app, HttpMethod::Get, "/shared/thing");
    assert_eq!(body_text(&out), "from first");
    assert_eq!(trace.entries(), ["first"]);
}

#[test]
fn test_middleware_runs_in_registration_order() {
    let trace = Trace::default();
    let (outer, inner, handler) = (trace.clone(), trace.clone(), trace.clone());

    let mut app = App::new();
    app.use_fn_at("/a", move |req, _| {
        outer.push(format!("outer:{}", req.relative_path()));
        next()
    });
    app.use_fn_at("/a/b", move |req, _| {
        inner.push(format!("inner:{}", req.relative_path()));
        next()
    });
    app.get("/a/b/c", move |_, res| {
        handler.push("handler");
        res.send();
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/a/b/c");
    assert_eq!(out.status, 200);
    assert_eq!(trace.entries(), ["outer:/b/c", "inner:/c", "handler"]);
}

#[test]
fn test_halting_middleware_blocks_later_stages() {
    let trace = Trace::default();
    let later = trace.clone();

    let mut app = App::new();
    app.use_fn_at("/a", |_, res| {
        res.send_error(403);
        halt()
    });
    app.use_fn_at("/a/b", move |_, _| {
        later.push("later");
        next()
    });

    let out = send(&app, HttpMethod::Get, "/a/b/c");
    assert_eq!(out.status, 403);
    assert!(trace.entries().is_empty());
}

#[test]
fn test_mount_params_survive_route_params() {
    let mut app = App::new();
    app.use_fn_at("/users/:id", |req, res| {
        let id = req.path_param("id").unwrap_or("-").to_string();
        res.set_header("x-user", &id);
        next()
    });
    app.get("/users/:id/posts/:post", |req, res| {
        let reply = format!(
            "{}/{}",
            req.path_param("id").unwrap_or("-"),
            req.path_param("post").unwrap_or("-")
        );
        res.send_text(reply);
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/users/42/posts/9");
    assert_eq!(out.headers.get("x-user").unwrap(), "42");
    assert_eq!(body_text(&out), "42/9");
}

#[test]
fn test_wildcard_route_matches_one_segment() {
    let mut app = App::new();
    app.get("/files/*", |_, res| {
        res.send_text("file");
        Ok(())
    });

    assert_eq!(send(&app, HttpMethod::Get, "/files/a.txt").status, 200);
    assert_eq!(send(&app, HttpMethod::Get, "/files/a/b.txt").status, 404);
    assert_eq!(send(&app, HttpMethod::Get, "/files").status, 404);
}

#[test]
fn test_json_body_round_trip() {
    let mut app = App::new();
    app.use_middleware(RequestLogger)
        .use_at("/api", JsonBodyParser)
        .post("/api/echo", |req, res| {
            let name = req
                .body()
                .and_then(|body| body.as_json().ok())
                .and_then(|json| json.value.get("name").cloned())
                .unwrap_or(serde_json::Value::Null);
            res.send_json(&serde_json::json!({ "hello": name }))?;
            Ok(())
        });

    let inbound = InboundRequest::new(HttpMethod::Post, "/api/echo")
        .with_headers(headers(&[("content-type", "application/json")]))
        .with_raw_body(r#"{"name":"ada"}"#);
    let out = app.handle(inbound).unwrap();

    assert_eq!(out.status, 200);
    assert_eq!(out.headers.get("content-type").unwrap(), "application/json");
    let value: serde_json::Value = serde_json::from_slice(&out.body).unwrap();
    assert_eq!(value["hello"], "ada");

    let malformed = InboundRequest::new(HttpMethod::Post, "/api/echo")
        .with_headers(headers(&[("content-type", "application/json")]))
        .with_raw_body("{oops");
    assert_eq!(app.handle(malformed).unwrap().status, 400);
}

#[test]
fn test_cors_preflight_is_answered_by_middleware() {
    let mut app = App::new();
    app.use_middleware(Cors::builder().allow_origin("https://app.example").build());
    app.get("/data", |_, res| {
        res.send_text("data");
        Ok(())
    });

    let preflight = InboundRequest::new(HttpMethod::Options, "/data").with_headers(headers(&[
        ("origin", "https://app.example"),
        ("access-control-request-method", "GET"),
    ]));
    let out = app.handle(preflight).unwrap();
    assert_eq!(out.status, 204);
    assert_eq!(
        out.headers.get("access-control-allow-origin").unwrap(),
        "https://app.example"
    );

    let simple = InboundRequest::new(HttpMethod::Get, "/data")
        .with_headers(headers(&[("origin", "https://app.example")]));
    let out = app.handle(simple).unwrap();
    assert_eq!(body_text(&out), "data");
    assert!(out.headers.get("access-control-allow-origin").is_some());
}

#[test]
fn test_static_files_mounted_under_prefix() {
    let public = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("site.css"), "body{}").unwrap();

    let mut app = App::new();
    app.use_at("/assets", ServeStatic::new(public.path()));
    app.get("/assets/version", |_, res| {
        res.send_text("v1");
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/assets/site.css");
    assert_eq!(out.status, 200);
    assert_eq!(out.headers.get("content-type").unwrap(), "text/css");
    assert_eq!(body_text(&out), "body{}");

    let out = send(&app, HttpMethod::Get, "/assets/version");
    assert_eq!(body_text(&out), "v1");

    assert_eq!(send(&app, HttpMethod::Get, "/assets/../site.css").status, 404);
    assert_eq!(send(&app, HttpMethod::Get, "/assets/missing.css").status, 404);
}

#[test]
fn test_handler_panic_is_contained() {
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::fmt().with_test_writer().finish(),
    );

    let mut app = App::new();
    app.get("/boom", |_, _| panic!("handler bug"));
    app.get("/fine", |_, res| {
        res.send_text("fine");
        Ok(())
    });

    assert_eq!(send(&app, HttpMethod::Get, "/boom").status, 500);
    assert_eq!(send(&app, HttpMethod::Get, "/fine").status, 200);
}

#[test]
fn test_redirect_and_custom_message() {
    let mut app = App::new();
    app.get("/old", |_, res| {
        res.redirect("/new");
        Ok(())
    });
    app.get("/teapot", |_, res| {
        res.set_status(418).set_message("I'm a teapot");
        Ok(())
    });

    let out = send(&app, HttpMethod::Get, "/old");
    assert_eq!(out.status, 302);
    assert_eq!(out.headers.get("location").unwrap(), "/new");

    let out = send(&app, HttpMethod::Get, "/teapot");
    assert_eq!(out.status, 418);
    assert_eq!(out.message, "I'm a teapot");
}

#[tokio::test]
async fn test_listen_serves_until_shutdown() {
    let addr = {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        reserved.local_addr().unwrap().to_string()
    };

    let mut app = App::new();
    app.get("/health", |_, res| {
        res.send_text("ok");
        Ok(())
    });

    let config = ServerConfig::builder()
        .http_addr(addr.clone())
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let shutdown = ShutdownSignal::new();
    let server = tokio::spawn(app.listen_with_shutdown(config, shutdown.clone()));

    let mut stream = None;
    for _ in 0..50 {
        if let Ok(s) = TcpStream::connect(&addr).await {
            stream = Some(s);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let mut stream = stream.expect("server did not start");

    stream
        .write_all(b"GET /health HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let raw = String::from_utf8(buf).unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.ends_with("ok"), "{raw}");

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
