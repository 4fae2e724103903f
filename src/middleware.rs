use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};

use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorMessage, HttpError},
    models::chatmodels::SenderRole,
    utils::token,
    AppState,
};

/// Verified token claims, inserted into request extensions for handlers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthClaims {
    pub phone: String,
    pub role: SenderRole,
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    auth_value
                        .strip_prefix("Bearer ")
                        .map(|value| value.to_owned())
                })
        });

    let token = token
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    // Missing token is 401 above; a token that fails verification is 403.
    let claims = token::decode_token(&token, app_state.env.jwt_secret.as_bytes())
        .map_err(|_| HttpError::forbidden(ErrorMessage::InvalidToken.to_string()))?;

    req.extensions_mut().insert(JWTAuthClaims {
        phone: claims.sub,
        role: claims.role,
    });

    Ok(next.run(req).await)
}
