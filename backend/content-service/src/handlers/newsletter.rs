//! Newsletter subscription handler.

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::SubscribeRequest;
use crate::services::{NewsletterService, SubscribeOutcome};

pub async fn subscribe(
    service: web::Data<NewsletterService>,
    req: web::Json<SubscribeRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|_| AppError::ValidationError("a valid email address is required".to_string()))?;

    match service.subscribe(&req.email).await? {
        SubscribeOutcome::Subscribed => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully subscribed!"
        }))),
        SubscribeOutcome::Rejected { status, body } => {
            // relay the provider's verdict so the client can show it
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok(HttpResponse::build(status).json(body))
        }
    }
}
