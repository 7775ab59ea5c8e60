//! HTTP middleware for content-service
//!
//! Session authentication resolves a caller's bearer token against the
//! identity provider and stashes the resulting [`Session`] (user id
//! plus the token itself, which engagement writes forward so row
//! policies apply to the caller) in request extensions. Requests
//! without a usable token pass through without a session; handlers
//! that require one take `Session` as an extractor and answer 401
//! with a sign-in prompt before anything is sent upstream.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use supabase_rest::SupabaseClient;
use tracing::{debug, warn};
use uuid::Uuid;

/// Authenticated caller stored in request extensions.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub token: String,
}

/// Actix middleware that resolves a Bearer token to a [`Session`].
pub struct SessionAuthMiddleware {
    client: SupabaseClient,
}

impl SessionAuthMiddleware {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
            client: self.client.clone(),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
    client: SupabaseClient,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let client = self.client.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string);

            if let Some(token) = token {
                match client.auth_user(&token).await {
                    Ok(Some(user)) => {
                        req.extensions_mut().insert(Session {
                            user_id: user.id,
                            token,
                        });
                    }
                    Ok(None) => debug!("bearer token rejected by the identity provider"),
                    Err(e) => warn!("session lookup failed: {}", e),
                }
            }

            service.call(req).await
        })
    }
}

impl FromRequest for Session {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Session>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Please sign in to continue")),
        )
    }
}
