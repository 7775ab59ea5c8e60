//! PDF preview generation.
//!
//! Rasterization itself lives in an external renderer; this service
//! downloads the PDF, hands the bytes to the renderer, and returns the
//! first page as a base64 JPEG for the upload preview card.

use base64::Engine as _;
use tracing::error;

use crate::config::PreviewConfig;
use crate::error::{AppError, Result};

pub struct PreviewService {
    http: reqwest::Client,
    config: PreviewConfig,
}

impl PreviewService {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn render_first_page(&self, url: &str) -> Result<String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::BadRequest("url must be http or https".to_string()));
        }

        let pdf_resp = self.http.get(url).send().await?;
        if !pdf_resp.status().is_success() {
            return Err(AppError::Upstream(format!(
                "pdf download failed with status {}",
                pdf_resp.status().as_u16()
            )));
        }
        let pdf = pdf_resp.bytes().await?;

        let render_resp = self
            .http
            .post(&self.config.renderer_url)
            .header("Content-Type", "application/pdf")
            .body(pdf)
            .send()
            .await
            .map_err(|e| {
                error!("renderer unreachable: {}", e);
                AppError::Upstream("preview generation failed".to_string())
            })?;

        if !render_resp.status().is_success() {
            error!(status = render_resp.status().as_u16(), "renderer rejected the pdf");
            return Err(AppError::Upstream("preview generation failed".to_string()));
        }

        let jpeg = render_resp.bytes().await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(&jpeg))
    }
}
