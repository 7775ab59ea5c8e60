//! Engagement handlers: likes, ratings, comments, view counting.
//!
//! Mutations run behind the session middleware; a request without a
//! session is turned away with a sign-in prompt before anything is
//! sent upstream.

use actix_web::{web, HttpResponse};
use serde_json::json;
use supabase_rest::SupabaseClient;

use crate::db::{EngagementRepo, SummaryRepo};
use crate::error::{AppError, Result};
use crate::middleware::Session;
use crate::models::{CreateCommentRequest, RateRequest};

pub async fn like_summary(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    session: Session,
) -> Result<HttpResponse> {
    let repo = EngagementRepo::new((**client).clone());
    repo.like(&session.token, &id, session.user_id).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn unlike_summary(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    session: Session,
) -> Result<HttpResponse> {
    let repo = EngagementRepo::new((**client).clone());
    repo.unlike(&session.token, &id, session.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Store a 1-5 star rating and answer with the fresh average.
pub async fn rate_summary(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    session: Session,
    req: web::Json<RateRequest>,
) -> Result<HttpResponse> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::ValidationError(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let repo = EngagementRepo::new((**client).clone());
    repo.rate(&session.token, &id, session.user_id, req.rating)
        .await?;

    let avg = SummaryRepo::new((**client).clone()).average_rating(&id).await;
    Ok(HttpResponse::Ok().json(json!({ "avg_rating": avg })))
}

/// The caller's own engagement with a summary: liked or not, and the
/// rating they stored.
pub async fn get_my_engagement(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    session: Session,
) -> Result<HttpResponse> {
    let repo = EngagementRepo::new((**client).clone());
    let (has_liked, rating) = tokio::try_join!(
        repo.has_liked(&id, session.user_id),
        repo.user_rating(&id, session.user_id),
    )?;
    Ok(HttpResponse::Ok().json(json!({
        "has_liked": has_liked,
        "rating": rating,
    })))
}

pub async fn get_comments(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let repo = EngagementRepo::new((**client).clone());
    let comments = repo.comments(&id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn add_comment(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    session: Session,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::ValidationError(
            "comment content cannot be empty".to_string(),
        ));
    }

    let repo = EngagementRepo::new((**client).clone());
    let comment = repo
        .add_comment(&session.token, &id, session.user_id, content)
        .await?;
    match comment {
        Some(comment) => Ok(HttpResponse::Created().json(comment)),
        None => Ok(HttpResponse::Created().finish()),
    }
}

pub async fn delete_comment(
    client: web::Data<SupabaseClient>,
    comment_id: web::Path<String>,
    session: Session,
) -> Result<HttpResponse> {
    let repo = EngagementRepo::new((**client).clone());
    let deleted = repo
        .delete_comment(&session.token, &comment_id, session.user_id)
        .await?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(
            "comment not found or not yours".to_string(),
        ))
    }
}

/// Count a page view. Best effort and anonymous; a failing counter
/// never breaks the reading experience.
pub async fn record_view(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let repo = EngagementRepo::new((**client).clone());
    repo.increment_views(&id).await;
    Ok(HttpResponse::Accepted().finish())
}
