use http::Method;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use switchyard::{
    compose, handler_fn, param_fn, AllowedOrigin, CorsPolicy, Handler, HttpError, Next, Request,
    RequestContext, RouteOptions, RouteSpec, Router, RouterConfig,
};

mod tracing_util;
use tracing_util::TestTracing;

type CallLog = Arc<Mutex<Vec<String>>>;

fn context(method: Method, path: &str) -> RequestContext {
    RequestContext::new(Request::new(method, path))
}

/// A pass-through handler that records its name before yielding to the rest
/// of the chain.
fn marker(log: &CallLog, name: &str) -> Handler {
    let log = Arc::clone(log);
    let name = name.to_string();
    handler_fn(move |ctx, next| {
        log.lock().unwrap().push(name.clone());
        next.run(ctx)
    })
}

/// A terminal handler that records its name and sets a status.
fn responder(log: &CallLog, name: &str, status: u16) -> Handler {
    let log = Arc::clone(log);
    let name = name.to_string();
    handler_fn(move |ctx, _next| {
        log.lock().unwrap().push(name.clone());
        ctx.response.set_status(status);
        Ok(())
    })
}

fn taken(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_single_route_dispatch() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router.get("/items/{id}", vec![responder(&log, "get", 200)]);
    let handler = router.routes();

    let mut ctx = context(Method::GET, "/items/7");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 200);
    assert_eq!(taken(&log), vec!["get"]);
}

#[test]
fn test_matching_routes_run_in_registration_order() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router
        .get("/items", vec![marker(&log, "first")])
        .get("/items", vec![responder(&log, "second", 200)]);
    let handler = router.routes();

    let mut ctx = context(Method::GET, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(taken(&log), vec!["first", "second"]);
    assert_eq!(ctx.response.status(), 200);
}

#[test]
fn test_router_middleware_runs_before_route_middleware() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router.use_middleware(marker(&log, "shared"));
    router.get("/items", vec![responder(&log, "route", 200)]);
    let handler = router.routes();

    let mut ctx = context(Method::GET, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(taken(&log), vec!["shared", "route"]);
}

#[test]
fn test_param_handlers_run_before_middleware_with_captures() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    let param_log = Arc::clone(&log);
    router.param(
        "id",
        param_fn(move |ctx, next, value| {
            param_log.lock().unwrap().push(format!("id={value}"));
            next.run(ctx)
        }),
    );
    router.get("/items/{id}", vec![responder(&log, "route", 200)]);
    let handler = router.routes();

    let mut ctx = context(Method::GET, "/items/42");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(taken(&log), vec!["id=42", "route"]);
}

#[test]
fn test_method_not_allowed_names_declared_methods() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    let spec = RouteSpec::new(
        "/items",
        vec![Method::GET, Method::POST],
        vec![responder(&log, "route", 200)],
    );
    router.route(spec).unwrap();
    let handler = router.routes();

    let mut ctx = context(Method::DELETE, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 405);
    assert_eq!(ctx.response.header("allow"), Some("GET, POST"));
    assert_eq!(
        ctx.response.body,
        Some(Value::String("Method Not Allowed".to_string()))
    );
    assert!(taken(&log).is_empty());
}

#[test]
fn test_allow_header_unions_across_routes() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router
        .get("/items", vec![marker(&log, "get")])
        .post("/items", vec![marker(&log, "post")]);
    let handler = router.routes();

    let mut ctx = context(Method::DELETE, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 405);
    assert_eq!(ctx.response.header("allow"), Some("GET, POST"));
}

#[test]
fn test_allow_aggregation_respects_opt_out() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router.get("/items", vec![marker(&log, "get")]);
    let spec = RouteSpec::new("/items", vec![Method::POST], vec![marker(&log, "post")]).options(
        RouteOptions {
            allowed_methods: Some(false),
            ..RouteOptions::default()
        },
    );
    router.route(spec).unwrap();
    let handler = router.routes();

    let mut ctx = context(Method::DELETE, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 405);
    assert_eq!(ctx.response.header("allow"), Some("GET"));
}

#[test]
fn test_unmatched_path_falls_through_untouched() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router.get("/items", vec![responder(&log, "route", 200)]);
    let stack = compose(vec![router.routes(), responder(&log, "tail", 418)]);

    let mut ctx = context(Method::GET, "/elsewhere");
    stack(&mut ctx, Next::end()).unwrap();

    // Only the downstream handler ran.
    assert_eq!(taken(&log), vec!["tail"]);
    assert_eq!(ctx.response.status(), 418);
}

#[test]
fn test_prefix_gates_and_strips() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::with_config(RouterConfig {
        prefix: Some("api".to_string()),
        ..RouterConfig::default()
    });
    router.get("/items", vec![responder(&log, "route", 200)]);
    let stack = compose(vec![router.routes(), responder(&log, "tail", 418)]);

    let mut ctx = context(Method::GET, "/api/items");
    stack(&mut ctx, Next::end()).unwrap();
    assert_eq!(ctx.response.status(), 200);

    let mut other = context(Method::GET, "/items");
    stack(&mut other, Next::end()).unwrap();
    assert_eq!(other.response.status(), 418);
    assert_eq!(taken(&log), vec!["route", "tail"]);
}

#[test]
fn test_options_probe_without_cors_is_not_found() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router.get("/items", vec![marker(&log, "get")]);
    let handler = router.routes();

    let mut ctx = context(Method::OPTIONS, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 404);
    assert_eq!(ctx.response.body, Some(Value::String("Not Found".to_string())));
}

fn cors_policy(origin: &str) -> CorsPolicy {
    CorsPolicy {
        allowed_origin: AllowedOrigin::Literal(origin.to_string()),
        allowed_methods: vec![Method::GET, Method::POST],
        allowed_headers: vec!["x-request-id".to_string()],
        max_age: 600,
        ..CorsPolicy::default()
    }
}

#[test]
fn test_preflight_allowed_origin_gets_204() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    let spec = RouteSpec::new("/items", vec![Method::GET], vec![marker(&log, "get")]).options(
        RouteOptions {
            cors: Some(vec![cors_policy("https://app.example")]),
            ..RouteOptions::default()
        },
    );
    router.route(spec).unwrap();
    let handler = router.routes();

    let mut ctx = RequestContext::new(
        Request::new(Method::OPTIONS, "/items").with_header("origin", "https://app.example"),
    );
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 204);
    assert_eq!(
        ctx.response.header("access-control-allow-origin"),
        Some("https://app.example")
    );
    assert_eq!(
        ctx.response.header("access-control-allow-methods"),
        Some("GET, POST")
    );
    assert_eq!(ctx.response.header("access-control-max-age"), Some("600"));
    assert!(taken(&log).is_empty());
}

#[test]
fn test_preflight_rejected_origin_gets_403() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    let spec = RouteSpec::new("/items", vec![Method::GET], vec![marker(&log, "get")]).options(
        RouteOptions {
            cors: Some(vec![cors_policy("https://app.example")]),
            ..RouteOptions::default()
        },
    );
    router.route(spec).unwrap();
    let handler = router.routes();

    let mut ctx = RequestContext::new(
        Request::new(Method::OPTIONS, "/items").with_header("origin", "https://evil.example"),
    );
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 403);
}

#[test]
fn test_preflight_denial_outranks_sibling_miss() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    // First route has no CORS policy, so the probe misses it; the second
    // carries one that rejects the origin. The denial response wins over the
    // sibling's 404.
    let mut router = Router::new();
    router.get("/items", vec![marker(&log, "plain")]);
    let spec = RouteSpec::new("/items", vec![Method::GET], vec![marker(&log, "cors")]).options(
        RouteOptions {
            cors: Some(vec![cors_policy("https://app.example")]),
            ..RouteOptions::default()
        },
    );
    router.route(spec).unwrap();
    let handler = router.routes();

    let mut ctx = RequestContext::new(
        Request::new(Method::OPTIONS, "/items").with_header("origin", "https://evil.example"),
    );
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 403);
}

#[test]
fn test_handler_error_is_absorbed_without_body_by_default() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::new();
    router.get(
        "/items",
        vec![handler_fn(|_ctx, _next| {
            Err(HttpError::internal("database unreachable"))
        })],
    );
    let stack = compose(vec![router.routes(), marker(&log, "tail")]);

    let mut ctx = context(Method::GET, "/items");
    stack(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 500);
    assert_eq!(ctx.response.body, None);
    // Recovery still hands the request downstream.
    assert_eq!(taken(&log), vec!["tail"]);
}

#[test]
fn test_handler_error_body_exposed_when_configured() {
    let _tracing = TestTracing::init();

    let mut router = Router::with_config(RouterConfig {
        expose: true,
        ..RouterConfig::default()
    });
    router.get(
        "/items",
        vec![handler_fn(|_ctx, _next| {
            Err(HttpError::internal("database unreachable"))
        })],
    );
    let handler = router.routes();

    let mut ctx = context(Method::GET, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 500);
    assert_eq!(
        ctx.response.body,
        Some(Value::String("database unreachable".to_string()))
    );
}

#[test]
fn test_anyhow_failure_absorbed_as_internal_error() {
    let _tracing = TestTracing::init();

    fn load_record() -> anyhow::Result<u16> {
        Err(anyhow::anyhow!("record store offline"))
    }

    let mut router = Router::with_config(RouterConfig {
        expose: true,
        ..RouterConfig::default()
    });
    router.get(
        "/items",
        vec![handler_fn(|ctx, _next| {
            let status = load_record()?;
            ctx.response.set_status(status);
            Ok(())
        })],
    );
    let handler = router.routes();

    let mut ctx = context(Method::GET, "/items");
    handler(&mut ctx, Next::end()).unwrap();

    assert_eq!(ctx.response.status(), 500);
    assert_eq!(
        ctx.response.body,
        Some(Value::String("record store offline".to_string()))
    );
}

#[test]
fn test_sensitive_route_matching() {
    let _tracing = TestTracing::init();
    let log: CallLog = CallLog::default();

    let mut router = Router::with_config(RouterConfig {
        sensitive: true,
        ..RouterConfig::default()
    });
    router.get("/Items", vec![responder(&log, "route", 200)]);
    let stack = compose(vec![router.routes(), responder(&log, "tail", 418)]);

    let mut miss = context(Method::GET, "/items");
    stack(&mut miss, Next::end()).unwrap();
    assert_eq!(miss.response.status(), 418);

    let mut hit = context(Method::GET, "/Items");
    stack(&mut hit, Next::end()).unwrap();
    assert_eq!(hit.response.status(), 200);
}
