use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::Deserialize;

use super::{not_blank, required};
use crate::{
    app::{AppError, AppState},
    auth::Caller,
    database::models::user::{User, UserChanges},
    responses::UserResponse,
};

const USERNAME_MAX_LENGTH: usize = 150;

#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn validate_username(raw: String) -> Result<String, AppError> {
    let username = not_blank("username", raw)?;

    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(AppError::validation(format!(
            "username: Ensure this field has no more than {USERNAME_MAX_LENGTH} characters."
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !username.chars().all(allowed) {
        return Err(AppError::validation(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    Ok(username)
}

/// Empty is allowed, anything else needs a non-empty local part and domain.
fn validate_email(raw: String) -> Result<String, AppError> {
    let email = raw.trim().to_string();
    if email.is_empty() {
        return Ok(email);
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(AppError::validation("email: Enter a valid email address.")),
    }
}

fn validate_password(raw: String) -> Result<String, AppError> {
    if raw.is_empty() {
        return Err(AppError::validation("password: This field may not be blank."));
    }

    Ok(raw)
}

/// Refuses changes to anyone but yourself.
fn ensure_self(caller: &Caller, user_id: &str) -> Result<(), AppError> {
    if caller.id() != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(())
}

/// Pipe for registering an user
/// - url: `{domain}/users/`
///
/// # HTTP request requirements
/// ## body
/// - json with `username`, `password` and optionally `email`
///
/// # Example
/// ```
/// let request = actix_web::test::TestRequest::post()
///     .uri("/users/")
///     .set_json(json!({ "username": "alice", "email": "a@x.com", "password": "pw123" }))
///     .to_request();
/// ```
///
/// # Response
/// ## Created
/// ```
/// { "id": "e60a0f7b-381c-46b7-8736-1f204b329727", "username": "alice", "email": "a@x.com" }
/// ```
/// ## Error
/// - Bad request
/// - Conflict, the username is taken
pub async fn register(
    app_state: Data<AppState>,
    payload: Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let username = validate_username(required("username", payload.username)?)?;
    let email = validate_email(payload.email.unwrap_or_default())?;
    let password = validate_password(required("password", payload.password)?)?;

    let mut conn = app_state.conn()?;
    let user = User::new(&mut conn, &username, &email, &password)?;
    log::info!("registered user {} ({})", user.username, user.id);

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Pipe for listing all users, ordered by username
/// - url: `{domain}/users/`
pub async fn list_users(app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let users: Vec<UserResponse> = User::all(&mut conn)?.iter().map(UserResponse::from).collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Pipe for getting one user
/// - url: `{domain}/users/{id}/`
pub async fn retrieve_user(
    app_state: Data<AppState>,
    user_id: Path<String>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let user = User::find_by_id(&mut conn, &user_id)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

async fn save_user(
    app_state: Data<AppState>,
    caller: Caller,
    user_id: String,
    payload: UserPayload,
    partial: bool,
) -> Result<HttpResponse, AppError> {
    let (username, password) = if partial {
        (payload.username, payload.password)
    } else {
        (
            Some(required("username", payload.username)?),
            Some(required("password", payload.password)?),
        )
    };
    let changes = UserChanges {
        username: username.map(validate_username).transpose()?,
        email: payload.email.map(validate_email).transpose()?,
        password: password.map(validate_password).transpose()?,
    };

    let mut conn = app_state.conn()?;
    let mut user = User::find_by_id(&mut conn, &user_id)?;
    ensure_self(&caller, &user.id)?;
    user.edit(&mut conn, changes)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Pipe for replacing an user's username, email and password
/// - url: `{domain}/users/{id}/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>` of that same user
/// ## body
/// - json with `username`, `password` and optionally `email`
///
/// # Response
/// ## Ok
/// - the updated user
/// ## Error
/// - Unauthorized
/// - Forbidden
/// - Not found
/// - Bad request
/// - Conflict
pub async fn update_user(
    app_state: Data<AppState>,
    caller: Caller,
    user_id: Path<String>,
    payload: Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    save_user(app_state, caller, user_id.into_inner(), payload.into_inner(), false).await
}

/// Same as [update_user] with every field optional
pub async fn partial_update_user(
    app_state: Data<AppState>,
    caller: Caller,
    user_id: Path<String>,
    payload: Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    save_user(app_state, caller, user_id.into_inner(), payload.into_inner(), true).await
}

/// Pipe for deleting an user, this also deletes everything the user posted or liked
/// - url: `{domain}/users/{id}/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>` of that same user
///
/// # Response
/// ## No content
/// ## Error
/// - Unauthorized
/// - Forbidden
/// - Not found
pub async fn destroy_user(
    app_state: Data<AppState>,
    caller: Caller,
    user_id: Path<String>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let user = User::find_by_id(&mut conn, &user_id)?;
    ensure_self(&caller, &user.id)?;

    user.delete(&mut conn)?;
    log::info!("deleted user {} ({})", user.username, user.id);

    Ok(HttpResponse::NoContent().finish())
}
