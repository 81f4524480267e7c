use axum::{
    extract::{FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use berth_core::identity::{Actor, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::state::{AppState, AuthConfig};

/// JWT claims issued by the identity service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Actor {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Signs a token for `actor`; used by the identity service and by tests.
pub fn issue_token(auth: &AuthConfig, actor: &Actor) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: actor.user_id,
        role: actor.role,
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message, "kind": "Unauthorized" }))).into_response()
}

async fn authenticate(state: &AppState, req: Request) -> Result<(Actor, Request), Response> {
    let (mut parts, body) = req.into_parts();

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, state)
            .await
            .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Access denied. No token provided."))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        reject(StatusCode::UNAUTHORIZED, "Invalid token.")
    })?;

    Ok((Actor::from(&token_data.claims), Request::from_parts(parts, body)))
}

/// Any authenticated caller; the resolved `Actor` is placed in request extensions.
pub async fn user_auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match authenticate(&state, req).await {
        Ok((actor, mut req)) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(response) => response,
    }
}

pub async fn admin_auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match authenticate(&state, req).await {
        Ok((actor, mut req)) => {
            if !actor.is_admin() {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": "Access denied. Admin only.", "kind": "Forbidden" })),
                )
                    .into_response();
            }
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(response) => response,
    }
}
