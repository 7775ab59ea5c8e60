//! Guard-path tests: requests that must be rejected locally, before
//! anything is sent to an upstream provider. The store client points at
//! an unroutable address so any accidental upstream call fails loudly.

use actix_web::{test, web, App};
use std::sync::Arc;

use content_service::config::NewsletterConfig;
use content_service::handlers::{self, FeedHandlerState};
use content_service::services::NewsletterService;
use feed_service::store::SupabaseStore;
use supabase_rest::SupabaseClient;

fn dead_client() -> SupabaseClient {
    SupabaseClient::new("http://127.0.0.1:1", "anon-key")
}

#[actix_web::test]
async fn test_engagement_mutations_without_a_session_get_a_sign_in_prompt() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(dead_client()))
            .service(
                web::resource("/summaries/{id}/like")
                    .route(web::post().to(handlers::like_summary)),
            )
            .service(
                web::resource("/summaries/{id}/rating")
                    .route(web::put().to(handlers::rate_summary)),
            )
            .service(
                web::resource("/summaries/{id}/comments")
                    .route(web::post().to(handlers::add_comment)),
            )
            .service(
                web::resource("/comments/{comment_id}")
                    .route(web::delete().to(handlers::delete_comment)),
            ),
    )
    .await;

    let like = test::TestRequest::post()
        .uri("/summaries/abc/like")
        .to_request();
    assert_eq!(test::call_service(&app, like).await.status(), 401);

    let rate = test::TestRequest::put()
        .uri("/summaries/abc/rating")
        .set_json(serde_json::json!({ "rating": 5 }))
        .to_request();
    assert_eq!(test::call_service(&app, rate).await.status(), 401);

    let comment = test::TestRequest::post()
        .uri("/summaries/abc/comments")
        .set_json(serde_json::json!({ "content": "nice" }))
        .to_request();
    assert_eq!(test::call_service(&app, comment).await.status(), 401);

    let delete = test::TestRequest::delete()
        .uri("/comments/c1")
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), 401);
}

#[actix_web::test]
async fn test_publishing_without_a_session_gets_a_sign_in_prompt() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(dead_client()))
            .service(web::resource("/summaries").route(web::post().to(handlers::create_summary)))
            .service(
                web::resource("/summaries/{id}")
                    .route(web::put().to(handlers::update_summary)),
            ),
    )
    .await;

    let create = test::TestRequest::post()
        .uri("/summaries")
        .set_json(serde_json::json!({
            "title": "Deep Work",
            "author": "Cal Newport",
            "summary": "Focus without distraction.",
            "category": "Self-Help & Personal Development",
        }))
        .to_request();
    assert_eq!(test::call_service(&app, create).await.status(), 401);

    let update = test::TestRequest::put()
        .uri("/summaries/abc")
        .set_json(serde_json::json!({ "title": "Deeper Work" }))
        .to_request();
    assert_eq!(test::call_service(&app, update).await.status(), 401);
}

#[actix_web::test]
async fn test_block_endpoint_requires_a_category() {
    let state = FeedHandlerState::new(Arc::new(SupabaseStore::new(dead_client())));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .route("/feed/block", web::get().to(handlers::get_block)),
    )
    .await;

    let req = test::TestRequest::get().uri("/feed/block").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let blank = test::TestRequest::get()
        .uri("/feed/block?category=%20%20")
        .to_request();
    assert_eq!(test::call_service(&app, blank).await.status(), 400);
}

#[actix_web::test]
async fn test_subscribe_rejects_invalid_email_locally() {
    let service = NewsletterService::new(NewsletterConfig {
        api_url: "http://127.0.0.1:1".to_string(),
        api_key: "key".to_string(),
        group_id: "group".to_string(),
    });
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .route("/subscribe", web::post().to(handlers::subscribe)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/subscribe")
        .set_json(serde_json::json!({ "email": "not-an-email" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}
