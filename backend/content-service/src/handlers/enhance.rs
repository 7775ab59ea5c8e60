//! Description enhancement handler.

use actix_web::{web, HttpResponse};

use crate::error::{AppError, Result};
use crate::models::EnhanceRequest;
use crate::services::EnhanceService;

pub async fn enhance_description(
    service: web::Data<EnhanceService>,
    req: web::Json<EnhanceRequest>,
) -> Result<HttpResponse> {
    if req.description.trim().is_empty() {
        return Err(AppError::ValidationError(
            "description cannot be empty".to_string(),
        ));
    }
    let enhanced = service.enhance(&req.description, &req.steps).await?;
    Ok(HttpResponse::Ok().json(enhanced))
}
