use rand::seq::SliceRandom;
use serde_json::json;

use http_dispatch::{logger, AccessLog, Body, Config, HttpServer};

const JOKES: &[&str] = &[
    "Why do Java developers often wear glasses? They can't C#.",
    "I love pressing the F5 key. It's refreshing.",
    "There are 10 types of people in the world. Those who understand binary and those who don't.",
    "Why are assembly programmers often wet? They work below C level.",
    "My favourite computer based band is the Black IPs.",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load_from("config")?;
    logger::init(&cfg.logging)?;

    // Build the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_app(&cfg);

    let server = app.bind(&cfg)?;
    let close = server.close_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            close.close();
        }
    });

    server.serve().await;
    Ok(())
}

fn build_app(cfg: &Config) -> HttpServer {
    let mut app = HttpServer::new();

    app.preprocessor(|_req, reply| {
        reply.header("Access-Control-Allow-Origin", "*");
    });

    if cfg.logging.access_log {
        app.middleware(AccessLog::from_config(&cfg.logging));
    }

    app.error(|req, _reply| {
        let body = json!({
            "code": 404,
            "message": "Route not found!",
            "path": req.path,
            "url": req.url,
        });
        Box::pin(async move { Body::Json(body) })
    });

    app.get("/", |req, reply| {
        Box::pin(async move {
            reply
                .status(418)
                .header("working", "true")
                .content_type("application/json")
                .cookie("working", "true");
            Body::Json(json!({
                "code": 418,
                "message": "Hello World!",
                "working": req.cookie("working"),
            }))
        })
    })
    .get("/api/joke", |_req, reply| {
        Box::pin(async move {
            let joke = JOKES.choose(&mut rand::thread_rng()).copied().unwrap_or_default();
            reply.json(&json!({ "code": 200, "joke": joke }));
            Body::Empty
        })
    })
    .get("/site", |_req, reply| {
        Box::pin(async move {
            reply.html(
                r#"<html>
  <head>
    <title>HTML Test</title>
    <link rel="stylesheet" type="text/css" href="/assets/style.css">
  </head>
  <body>
    <h1>Hello World!</h1>
  </body>
</html>"#,
            );
            Body::Empty
        })
    })
    .get("/api/user/:userId", |req, reply| {
        Box::pin(async move {
            reply.status(418).content_type("application/json");
            Body::Json(json!({
                "code": 418,
                "message": format!("UserID is {}", req.path_param("userId").unwrap_or_default()),
                "queryParams": req.query_params,
            }))
        })
    })
    .get("/api/visits", |req, _reply| {
        Box::pin(async move {
            let visits = req.session.get_as::<u64>("visits").unwrap_or(0) + 1;
            req.session.insert("visits", visits);
            Body::Json(json!({ "visits": visits }))
        })
    })
    .post("/api/echo", |req, _reply| {
        Box::pin(async move {
            match req.json::<serde_json::Value>().await {
                Ok(value) => Body::Json(value),
                Err(e) => Body::Json(json!({ "code": 400, "message": e.to_string() })),
            }
        })
    });

    app
}
