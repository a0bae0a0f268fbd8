use actix_web::{
    web::{Data, Json},
    HttpResponse,
};
use serde::{Deserialize, Serialize};

use super::required;
use crate::{
    app::{AppError, AppState},
    auth::token::TokenKind,
    database::models::user::User,
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessResponse {
    pub access: String,
}

fn signing_failed(err: jsonwebtoken::errors::Error) -> AppError {
    log::error!("could not sign token: {err}");
    AppError::InternalServerError
}

/// Pipe for exchanging credentials for a token pair
/// - url: `{domain}/token/`
///
/// # HTTP request requirements
/// ## body
/// - json with `username` and `password`
///
/// # Example
/// ```
/// let request = actix_web::test::TestRequest::post()
///     .uri("/token/")
///     .set_json(json!({ "username": "alice", "password": "pw123" }))
///     .to_request();
/// ```
///
/// # Response
/// ## Ok
/// ```
/// { "access": "eyJ0eXAi...", "refresh": "eyJ0eXAi..." }
/// ```
/// ## Error
/// - Bad request, a field is missing
/// - Unauthorized, unknown user or wrong password
pub async fn obtain_token(
    app_state: Data<AppState>,
    credentials: Json<Credentials>,
) -> Result<HttpResponse, AppError> {
    let credentials = credentials.into_inner();
    let username = required("username", credentials.username)?;
    let password = required("password", credentials.password)?;

    let user = {
        let mut conn = app_state.conn()?;
        User::find_by_username(&mut conn, &username)?
    };
    let user = match user {
        Some(user) if user.check_password(&password) => user,
        _ => {
            log::warn!("failed login for {username:?}");
            return Err(AppError::authentication(
                "No active account found with the given credentials",
            ));
        }
    };

    let pair = app_state.tokens.issue_pair(&user.id).map_err(signing_failed)?;
    log::info!("issued tokens for {}", user.username);

    Ok(HttpResponse::Ok().json(pair))
}

/// Pipe for exchanging a refresh token for a new access token
/// - url: `{domain}/token/refresh/`
///
/// # HTTP request requirements
/// ## body
/// - json with `refresh`
///
/// # Response
/// ## Ok
/// ```
/// { "access": "eyJ0eXAi..." }
/// ```
/// ## Error
/// - Bad request, `refresh` is missing
/// - Unauthorized, the token is invalid, expired or an access token
pub async fn refresh_token(
    app_state: Data<AppState>,
    payload: Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let refresh = required("refresh", payload.into_inner().refresh)?;

    let claims = app_state
        .tokens
        .verify(&refresh, TokenKind::Refresh)
        .map_err(|err| {
            log::debug!("rejected refresh token: {err}");
            AppError::authentication("Token is invalid or expired")
        })?;

    let access = app_state
        .tokens
        .issue(&claims.sub, TokenKind::Access)
        .map_err(signing_failed)?;

    Ok(HttpResponse::Ok().json(AccessResponse { access }))
}
