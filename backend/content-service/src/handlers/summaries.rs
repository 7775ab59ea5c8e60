//! Summary page handlers: slug/id resolution, stats, recommendations.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use supabase_rest::SupabaseClient;
use tracing::warn;

use crate::db::SummaryRepo;
use crate::error::{AppError, Result};
use crate::middleware::Session;
use crate::models::{CreateSummaryRequest, UpdateSummaryRequest};

#[derive(Deserialize)]
pub struct RecommendedParams {
    #[serde(default = "default_recommended_limit")]
    pub limit: usize,
}

fn default_recommended_limit() -> usize {
    10
}

/// Resolve a summary by slug first, then by id. A summary reached by
/// id that owns a slug gets a permanent redirect to its canonical
/// `/summary/<slug>` address.
pub async fn get_summary(
    client: web::Data<SupabaseClient>,
    param: web::Path<String>,
) -> Result<HttpResponse> {
    let repo = SummaryRepo::new((**client).clone());

    let by_slug = match repo.get_by_slug(&param).await {
        Ok(found) => found,
        Err(e) => {
            // a slug miss must not hide an id match
            warn!("slug lookup failed, trying id: {}", e);
            None
        }
    };
    if let Some(summary) = by_slug {
        return Ok(HttpResponse::Ok().json(summary));
    }

    match repo.get_by_id(&param).await? {
        Some(summary) => {
            if let Some(slug) = summary.slug.as_deref() {
                if slug != param.as_str() {
                    return Ok(HttpResponse::MovedPermanently()
                        .insert_header(("Location", format!("/summary/{}", slug)))
                        .finish());
                }
            }
            Ok(HttpResponse::Ok().json(summary))
        }
        None => Err(AppError::NotFound(format!("no summary named {}", param))),
    }
}

/// Publish a new summary under the caller's identity. The canonical
/// slug is derived from the title, with a numeric suffix when taken.
pub async fn create_summary(
    client: web::Data<SupabaseClient>,
    session: Session,
    req: web::Json<CreateSummaryRequest>,
) -> Result<HttpResponse> {
    for (field, value) in [
        ("title", &req.title),
        ("author", &req.author),
        ("summary", &req.summary),
        ("category", &req.category),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
    }

    let repo = SummaryRepo::new((**client).clone());
    let summary = repo.create(&session.token, session.user_id, &req).await?;
    Ok(HttpResponse::Created().json(summary))
}

/// Edit the caller's own summary. The slug stays stable; readers keep
/// their links.
pub async fn update_summary(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    session: Session,
    req: web::Json<UpdateSummaryRequest>,
) -> Result<HttpResponse> {
    if req.title.is_none() && req.author.is_none() && req.summary.is_none() && req.category.is_none()
    {
        return Err(AppError::ValidationError("nothing to update".to_string()));
    }
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::ValidationError("title cannot be empty".to_string()));
    }

    let repo = SummaryRepo::new((**client).clone());
    match repo.update(&session.token, &id, &req).await? {
        Some(summary) => Ok(HttpResponse::Ok().json(summary)),
        None => Err(AppError::NotFound(
            "summary not found or not yours".to_string(),
        )),
    }
}

/// Aggregate counts and average rating, fetched after the first paint.
pub async fn get_stats(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let repo = SummaryRepo::new((**client).clone());
    let stats = repo.stats(&id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Most-viewed summaries in the same category, excluding this one.
pub async fn get_recommended(
    client: web::Data<SupabaseClient>,
    id: web::Path<String>,
    query: web::Query<RecommendedParams>,
) -> Result<HttpResponse> {
    let repo = SummaryRepo::new((**client).clone());
    let summary = repo
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no summary with id {}", id)))?;
    let items = repo
        .recommended(&summary.category, &summary.id, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(items))
}
