use actix_web::{
    web::{Data, Json, Path, Query},
    HttpRequest, HttpResponse,
};
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use super::{not_blank, required};
use crate::{
    app::{AppError, AppState},
    auth::Caller,
    database::models::{blog::Blog, comment::Comment},
    pagination::{PageParams, COMMENT_PAGES},
    responses::CommentResponse,
};

#[derive(Debug, Default, Deserialize)]
pub struct CommentPayload {
    pub blog: Option<i32>,
    pub content: Option<String>,
}

/// A comment may only point at a blog that exists.
fn existing_blog(conn: &mut SqliteConnection, blog_id: i32) -> Result<i32, AppError> {
    if !Blog::exists(conn, blog_id)? {
        return Err(AppError::validation(format!(
            "blog: Invalid pk \"{blog_id}\" - object does not exist."
        )));
    }

    Ok(blog_id)
}

/// Pipe for listing comments of every blog, newest first
/// - url: `{domain}/comments/?page={n}&page_size={m}`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
///
/// # Response
/// ## Ok
/// - a page of comments, 5 per page unless `page_size` says otherwise (at most 50)
/// ## Error
/// - Unauthorized
/// - Not found, the page does not exist
pub async fn list_comments(
    req: HttpRequest,
    app_state: Data<AppState>,
    _caller: Caller,
    params: Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let count = Comment::count(&mut conn)?;

    let page = COMMENT_PAGES.paginate(&req, &params, count, |limit, offset| {
        let comments = Comment::page(&mut conn, limit, offset)?;
        comments
            .iter()
            .map(|comment| CommentResponse::build(comment, &mut conn).map_err(AppError::from))
            .collect::<Result<Vec<_>, _>>()
    })?;

    Ok(HttpResponse::Ok().json(page))
}

/// Pipe for commenting on a blog as the caller
/// - url: `{domain}/comments/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
/// ## body
/// - json with `blog` (id) and `content`
///
/// # Example
/// ```
/// let request = actix_web::test::TestRequest::post()
///     .uri("/comments/")
///     .insert_header((header::AUTHORIZATION, "Bearer eyJ0eXAi..."))
///     .set_json(json!({ "blog": 1, "content": "nice" }))
///     .to_request();
/// ```
///
/// # Response
/// ## Created
/// ## Error
/// - Unauthorized
/// - Bad request, including an unknown blog
pub async fn create_comment(
    app_state: Data<AppState>,
    caller: Caller,
    payload: Json<CommentPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let blog_id = required("blog", payload.blog)?;
    let content = not_blank("content", required("content", payload.content)?)?;

    let mut conn = app_state.conn()?;
    let blog_id = existing_blog(&mut conn, blog_id)?;
    let comment = Comment::new(&mut conn, blog_id, caller.id(), &content)?;
    log::info!("{} commented on blog {}", caller.user.username, blog_id);

    Ok(HttpResponse::Created().json(CommentResponse::build(&comment, &mut conn)?))
}

/// Pipe for getting one comment
/// - url: `{domain}/comments/{id}/`
pub async fn retrieve_comment(
    app_state: Data<AppState>,
    _caller: Caller,
    comment_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let comment = Comment::find_by_id(&mut conn, *comment_id)?;

    Ok(HttpResponse::Ok().json(CommentResponse::build(&comment, &mut conn)?))
}

async fn save_comment(
    app_state: Data<AppState>,
    comment_id: i32,
    payload: CommentPayload,
    partial: bool,
) -> Result<HttpResponse, AppError> {
    let (blog_id, content) = if partial {
        (payload.blog, payload.content)
    } else {
        (
            Some(required("blog", payload.blog)?),
            Some(required("content", payload.content)?),
        )
    };
    let content = content.map(|c| not_blank("content", c)).transpose()?;

    let mut conn = app_state.conn()?;
    let mut comment = Comment::find_by_id(&mut conn, comment_id)?;
    let blog_id = blog_id
        .map(|id| existing_blog(&mut conn, id))
        .transpose()?;
    comment.edit(&mut conn, blog_id, content)?;

    Ok(HttpResponse::Ok().json(CommentResponse::build(&comment, &mut conn)?))
}

/// Pipe for replacing a comment's blog and content
/// - url: `{domain}/comments/{id}/`
///
/// The author stays the same and is not checked against the caller.
///
/// # Response
/// ## Ok
/// ## Error
/// - Unauthorized
/// - Not found
/// - Bad request
pub async fn update_comment(
    app_state: Data<AppState>,
    _caller: Caller,
    comment_id: Path<i32>,
    payload: Json<CommentPayload>,
) -> Result<HttpResponse, AppError> {
    save_comment(app_state, comment_id.into_inner(), payload.into_inner(), false).await
}

/// Same as [update_comment] with every field optional
pub async fn partial_update_comment(
    app_state: Data<AppState>,
    _caller: Caller,
    comment_id: Path<i32>,
    payload: Json<CommentPayload>,
) -> Result<HttpResponse, AppError> {
    save_comment(app_state, comment_id.into_inner(), payload.into_inner(), true).await
}

/// Pipe for deleting a comment
/// - url: `{domain}/comments/{id}/`
pub async fn destroy_comment(
    app_state: Data<AppState>,
    caller: Caller,
    comment_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    if Comment::delete(&mut conn, *comment_id)? == 0 {
        return Err(AppError::NotFound);
    }
    log::info!("{} deleted comment {}", caller.user.username, comment_id);

    Ok(HttpResponse::NoContent().finish())
}
