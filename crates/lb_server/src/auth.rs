//! Request guards: JSON content type and HTTP basic auth.

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lb_store::StoreError;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::{AppState, REGISTER_PATH};

/// Name of the authenticated user, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

pub async fn require_json(req: Request, next: Next) -> Response {
    let ok = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));
    if !ok {
        warn!(path = %req.uri().path(), "bad content type");
        return ApiError::bad_request("Bad Content Type").into_response();
    }
    next.run(req).await
}

/// Registration is open; everything else needs valid credentials.
/// No credentials yield 401, unknown users and wrong passwords 403.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.uri().path() == REGISTER_PATH {
        return next.run(req).await;
    }

    let Some((name, password)) = basic_credentials(req.headers()) else {
        let mut resp = ApiError::unauthorized().into_response();
        resp.headers_mut().insert(
            WWW_AUTHENTICATE,
            HeaderValue::from_static(r#"Basic realm="lockbox""#),
        );
        return resp;
    };

    match state.store.check_user_auth(&name, &password).await {
        Ok(true) => {
            req.extensions_mut().insert(AuthUser(name));
            next.run(req).await
        }
        Ok(false) | Err(StoreError::NotFound(_)) => {
            warn!(user = %name, "access denied");
            ApiError::forbidden().into_response()
        }
        Err(e) => {
            error!(user = %name, error = %e, "auth check failed");
            ApiError::internal().into_response()
        }
    }
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, password) = decoded.split_once(':')?;
    Some((name.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(auth: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        h
    }

    #[test]
    fn parses_basic_credentials() {
        let encoded = STANDARD.encode("alice:s3:cret");
        let creds = basic_credentials(&headers(&format!("Basic {encoded}")));
        assert_eq!(creds, Some(("alice".into(), "s3:cret".into())));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert_eq!(basic_credentials(&HeaderMap::new()), None);
        assert_eq!(basic_credentials(&headers("Bearer abc")), None);
        assert_eq!(basic_credentials(&headers("Basic !!!")), None);
        let no_colon = STANDARD.encode("alice");
        assert_eq!(basic_credentials(&headers(&format!("Basic {no_colon}"))), None);
    }
}
