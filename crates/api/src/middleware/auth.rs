//! Admin guard for the `/admin` routes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use memora_core::error::CoreError;

use crate::auth::jwt::decode_claims;
use crate::error::AppError;
use crate::state::AppState;

/// A request carrying a valid admin bearer token.
///
/// Taking it as the first handler argument makes the route admin-only:
/// a missing or bad token is a 401, a non-admin role a 403.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// `jti` of the presented token.
    pub token_id: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(unauthorized)?;

        let claims = decode_claims(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        if !claims.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin access required".into(),
            )));
        }

        Ok(AdminUser {
            token_id: claims.jti,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Malformed Authorization header")?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Invalid Authorization format. Expected: Bearer <token>")
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert!(bearer_token(&headers("Basic YWRtaW4=")).is_err());
        assert!(bearer_token(&headers("Bearer   ")).is_err());
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err("Missing Authorization header")
        );
    }
}
