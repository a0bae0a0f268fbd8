pub mod blog;
pub mod comment;
pub mod like;
pub mod token;
pub mod user;

use actix_web::{
    error::{JsonPayloadError, PathError},
    web, HttpRequest, HttpResponse,
};
use serde_json::json;

use crate::app::AppError;

/// The routing table. Every (verb, path) the API answers is listed here.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(web::resource("/").route(web::get().to(api_root)))
        //User routes
        .service(
            web::resource("/users/")
                .route(web::get().to(user::list_users))
                .route(web::post().to(user::register)),
        )
        .service(
            web::resource("/users/{id}/")
                .route(web::get().to(user::retrieve_user))
                .route(web::put().to(user::update_user))
                .route(web::patch().to(user::partial_update_user))
                .route(web::delete().to(user::destroy_user)),
        )
        //Token routes
        .service(web::resource("/token/").route(web::post().to(token::obtain_token)))
        .service(web::resource("/token/refresh/").route(web::post().to(token::refresh_token)))
        //Blog routes
        .service(
            web::resource("/blogs/")
                .route(web::get().to(blog::list_blogs))
                .route(web::post().to(blog::create_blog)),
        )
        .service(
            web::resource("/blogs/{id}/")
                .route(web::get().to(blog::retrieve_blog))
                .route(web::put().to(blog::update_blog))
                .route(web::patch().to(blog::partial_update_blog))
                .route(web::delete().to(blog::destroy_blog)),
        )
        .service(web::resource("/blogs/{id}/like/").route(web::post().to(blog::like_blog)))
        .service(web::resource("/blogs/{id}/unlike/").route(web::post().to(blog::unlike_blog)))
        //Comment routes
        .service(
            web::resource("/comments/")
                .route(web::get().to(comment::list_comments))
                .route(web::post().to(comment::create_comment)),
        )
        .service(
            web::resource("/comments/{id}/")
                .route(web::get().to(comment::retrieve_comment))
                .route(web::put().to(comment::update_comment))
                .route(web::patch().to(comment::partial_update_comment))
                .route(web::delete().to(comment::destroy_comment)),
        )
        //Like routes
        .service(
            web::resource("/likes/")
                .route(web::get().to(like::list_likes))
                .route(web::post().to(like::create_like)),
        )
        .service(
            web::resource("/likes/{id}/")
                .route(web::get().to(like::retrieve_like))
                .route(web::put().to(like::update_like))
                .route(web::patch().to(like::partial_update_like))
                .route(web::delete().to(like::destroy_like)),
        );
}

/// Pipe for the API index, lists the collection urls
/// - url: `{domain}/`
///
/// # Response
/// ## Ok
/// ```
/// {
///     "users": "http://localhost:8080/users/",
///     "blogs": "http://localhost:8080/blogs/",
///     "comments": "http://localhost:8080/comments/",
///     "likes": "http://localhost:8080/likes/"
/// }
/// ```
pub async fn api_root(req: HttpRequest) -> HttpResponse {
    let info = req.connection_info();
    let base = format!("{}://{}", info.scheme(), info.host());

    HttpResponse::Ok().json(json!({
        "users": format!("{base}/users/"),
        "blogs": format!("{base}/blogs/"),
        "comments": format!("{base}/comments/"),
        "likes": format!("{base}/likes/"),
    }))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(format!("Malformed request body: {err}")).into()
}

fn path_error(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound.into()
}

/// A field every full write has to carry.
fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::validation(format!("{field}: This field is required.")))
}

/// Trims a text field and refuses it when nothing is left.
fn not_blank(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!(
            "{field}: This field may not be blank."
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::http::header;
    use chrono::Duration;

    use crate::{
        app::AppState,
        auth::token::{TokenKeys, TokenKind},
        database::{db_utils::test_pool, models::user::User},
    };

    /// App state over a fresh in-memory database.
    pub fn test_state() -> AppState {
        AppState::new(
            test_pool(),
            TokenKeys::new(b"test-secret", Duration::seconds(300), Duration::days(1)),
        )
    }

    /// Registers `username` straight in the store and returns it with an access token.
    pub fn signup(state: &AppState, username: &str) -> (User, String) {
        let mut conn = state.conn().unwrap();
        let user = User::new(
            &mut conn,
            username,
            &format!("{username}@example.com"),
            "test_password123",
        )
        .unwrap();
        let access = state.tokens.issue(&user.id, TokenKind::Access).unwrap();

        (user, access)
    }

    pub fn bearer(access: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {access}"))
    }
}
