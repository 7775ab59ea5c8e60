use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use content_service::handlers::{self, FeedHandlerState};
use content_service::middleware::SessionAuthMiddleware;
use content_service::services::{EnhanceService, NewsletterService, PreviewService};
use feed_service::store::SupabaseStore;
use std::sync::Arc;
use supabase_rest::SupabaseClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    client: SupabaseClient,
}

impl HealthState {
    async fn check_store(&self) -> Result<(), String> {
        self.client
            .from("book_summaries")
            .select("id")
            .limit(1)
            .fetch()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_store().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "content-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("store unreachable: {}", e),
            "service": "content-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// Content Service
///
/// HTTP API for the book-summary platform.
///
/// # Routes
///
/// - `/api/v1/summaries/*` - summary pages, stats, recommendations,
///   publishing and editing
/// - `/api/v1/feed/*`, `/api/v1/explore` - feed and browse projections
/// - engagement under `/api/v1/summaries/{id}/*` and `/api/v1/comments/*`
/// - `/api/v1/subscribe`, `/api/v1/enhance`, `/api/v1/preview` - proxies
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match content_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting content-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let client = SupabaseClient::new(&config.store.url, &config.store.api_key);
    let store = Arc::new(SupabaseStore::new(client.clone()));

    let feed_state = web::Data::new(FeedHandlerState::new(store));
    let client_data = web::Data::new(client.clone());
    let health_state = web::Data::new(HealthState {
        client: client.clone(),
    });
    let newsletter = web::Data::new(NewsletterService::new(config.newsletter.clone()));
    let enhance = web::Data::new(EnhanceService::new(config.enhance.clone()));
    let preview = web::Data::new(PreviewService::new(config.preview.clone()));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(client_data.clone())
            .app_data(feed_state.clone())
            .app_data(health_state.clone())
            .app_data(newsletter.clone())
            .app_data(enhance.clone())
            .app_data(preview.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(SessionAuthMiddleware::new(client.clone()))
                    .service(
                        web::scope("/feed")
                            .route("/placeholder", web::get().to(handlers::get_placeholder))
                            .route("/home", web::get().to(handlers::get_home))
                            .route("/block", web::get().to(handlers::get_block)),
                    )
                    .route("/explore", web::get().to(handlers::explore))
                    .service(
                        web::scope("/summaries")
                            .service(
                                web::resource("")
                                    .route(web::post().to(handlers::create_summary)),
                            )
                            .service(
                                web::resource("/{id}/stats")
                                    .route(web::get().to(handlers::get_stats)),
                            )
                            .service(
                                web::resource("/{id}/recommended")
                                    .route(web::get().to(handlers::get_recommended)),
                            )
                            .service(
                                web::resource("/{id}/comments")
                                    .route(web::get().to(handlers::get_comments))
                                    .route(web::post().to(handlers::add_comment)),
                            )
                            .service(
                                web::resource("/{id}/like")
                                    .route(web::post().to(handlers::like_summary))
                                    .route(web::delete().to(handlers::unlike_summary)),
                            )
                            .service(
                                web::resource("/{id}/rating")
                                    .route(web::put().to(handlers::rate_summary)),
                            )
                            .service(
                                web::resource("/{id}/views")
                                    .route(web::post().to(handlers::record_view)),
                            )
                            .service(
                                web::resource("/{id}/me")
                                    .route(web::get().to(handlers::get_my_engagement)),
                            )
                            .service(
                                web::resource("/{param}")
                                    .route(web::get().to(handlers::get_summary))
                                    .route(web::put().to(handlers::update_summary)),
                            ),
                    )
                    .service(
                        web::resource("/comments/{comment_id}")
                            .route(web::delete().to(handlers::delete_comment)),
                    )
                    .route("/subscribe", web::post().to(handlers::subscribe))
                    .route("/enhance", web::post().to(handlers::enhance_description))
                    .route("/preview", web::post().to(handlers::generate_preview)),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping HTTP server");
    server_handle.stop(true).await;
    match server_task.await {
        Ok(result) => result,
        Err(e) => Err(std::io::Error::new(std::io::ErrorKind::Other, e)),
    }
}
