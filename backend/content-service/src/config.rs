//! Configuration management for Content Service
//!
//! All settings come from environment variables with development
//! defaults; production refuses to start without the values that must
//! not be defaulted.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Hosted database service (rows, RPCs, auth)
    pub store: StoreConfig,
    /// Newsletter mail API
    pub newsletter: NewsletterConfig,
    /// AI model API for description enhancement
    pub enhance: EnhanceConfig,
    /// External PDF rasterizer
    pub preview: PreviewConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Hosted database service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project base URL
    pub url: String,
    /// Anon API key
    pub api_key: String,
}

/// Newsletter mail API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterConfig {
    /// Mail API base URL
    pub api_url: String,
    /// Mail API key
    pub api_key: String,
    /// Subscriber group to add signups to
    pub group_id: String,
}

/// Model API configuration for description enhancement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceConfig {
    /// Model generateContent endpoint
    pub api_url: String,
    /// Model API key
    pub api_key: String,
}

/// PDF rasterizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Rasterizer endpoint that turns a PDF body into a JPEG
    pub renderer_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let require = |name: &str, default: &str| -> Result<String, String> {
            match std::env::var(name) {
                Ok(value) => Ok(value),
                Err(_) if production => Err(format!("{} must be set in production", name)),
                Err(_) => Ok(default.to_string()),
            }
        };

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("CONTENT_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CONTENT_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8081),
            },
            cors: {
                let allowed_origins = require("CORS_ALLOWED_ORIGINS", "http://localhost:3000")?;
                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }
                CorsConfig { allowed_origins }
            },
            store: StoreConfig {
                url: require("SUPABASE_URL", "http://localhost:54321")?,
                api_key: require("SUPABASE_ANON_KEY", "dev-anon-key")?,
            },
            newsletter: NewsletterConfig {
                api_url: std::env::var("MAILERLITE_API_URL")
                    .unwrap_or_else(|_| "https://api.mailerlite.com/api/v2".to_string()),
                api_key: require("MAILERLITE_API_KEY", "dev-mail-key")?,
                group_id: std::env::var("MAILERLITE_GROUP_ID")
                    .unwrap_or_else(|_| "161087138063976399".to_string()),
            },
            enhance: EnhanceConfig {
                api_url: std::env::var("GEMINI_API_URL").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
                        .to_string()
                }),
                api_key: require("GEMINI_API_KEY", "dev-model-key")?,
            },
            preview: PreviewConfig {
                renderer_url: std::env::var("PDF_RENDERER_URL")
                    .unwrap_or_else(|_| "http://localhost:8090/render".to_string()),
            },
        })
    }
}
