//! PDF preview handler.

use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::models::{PreviewRequest, PreviewResponse};
use crate::services::PreviewService;

pub async fn generate_preview(
    service: web::Data<PreviewService>,
    req: web::Json<PreviewRequest>,
) -> Result<HttpResponse> {
    let preview = service.render_first_page(&req.url).await?;
    Ok(HttpResponse::Ok().json(PreviewResponse { preview }))
}
