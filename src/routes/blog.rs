use actix_web::{
    web::{Data, Json, Path, Query},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;

use super::{not_blank, required};
use crate::{
    app::{AppError, AppState},
    auth::Caller,
    database::models::{blog::Blog, like::Like},
    pagination::{PageParams, BLOG_PAGES},
    responses::{BlogResponse, StatusResponse},
};

const TITLE_MAX_LENGTH: usize = 200;

/// Body of blog writes. The author is never read from it, it is always the caller.
#[derive(Debug, Default, Deserialize)]
pub struct BlogPayload {
    pub title: Option<String>,
    pub content: Option<String>,
}

fn validate_title(raw: String) -> Result<String, AppError> {
    let title = not_blank("title", raw)?;
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(AppError::validation(format!(
            "title: Ensure this field has no more than {TITLE_MAX_LENGTH} characters."
        )));
    }

    Ok(title)
}

/// Pipe for listing blogs, newest first
/// - url: `{domain}/blogs/?page={n}&page_size={m}`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
///
/// # Response
/// ## Ok
/// ```
/// {
///     "count": 150,
///     "next": "http://localhost:8080/blogs/?page=2",
///     "previous": null,
///     "results": [ { "id": 150, "title": "...", ... } ]
/// }
/// ```
/// ## Error
/// - Unauthorized
/// - Not found, the page does not exist
pub async fn list_blogs(
    req: HttpRequest,
    app_state: Data<AppState>,
    _caller: Caller,
    params: Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let count = Blog::count(&mut conn)?;

    let page = BLOG_PAGES.paginate(&req, &params, count, |limit, offset| {
        let blogs = Blog::page(&mut conn, limit, offset)?;
        blogs
            .iter()
            .map(|blog| BlogResponse::build(blog, &mut conn).map_err(AppError::from))
            .collect::<Result<Vec<_>, _>>()
    })?;

    Ok(HttpResponse::Ok().json(page))
}

/// Pipe for posting a blog as the caller
/// - url: `{domain}/blogs/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
/// ## body
/// - json with `title` (at most 200 characters) and `content`
///
/// # Example
/// ```
/// let request = actix_web::test::TestRequest::post()
///     .uri("/blogs/")
///     .insert_header((header::AUTHORIZATION, "Bearer eyJ0eXAi..."))
///     .set_json(json!({ "title": "Hi", "content": "Body" }))
///     .to_request();
/// ```
///
/// # Response
/// ## Created
/// - the new blog with `likes_count` and `comments_count` at 0
/// ## Error
/// - Unauthorized
/// - Bad request
pub async fn create_blog(
    app_state: Data<AppState>,
    caller: Caller,
    payload: Json<BlogPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let title = validate_title(required("title", payload.title)?)?;
    let content = not_blank("content", required("content", payload.content)?)?;

    let mut conn = app_state.conn()?;
    let blog = Blog::new(&mut conn, &caller.user, &title, &content)?;
    log::info!("{} posted blog {}", caller.user.username, blog.id);

    Ok(HttpResponse::Created().json(BlogResponse::build(&blog, &mut conn)?))
}

/// Pipe for getting one blog
/// - url: `{domain}/blogs/{id}/`
pub async fn retrieve_blog(
    app_state: Data<AppState>,
    _caller: Caller,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let blog = Blog::get_by_id(&mut conn, *blog_id)?;

    Ok(HttpResponse::Ok().json(BlogResponse::build(&blog, &mut conn)?))
}

async fn save_blog(
    app_state: Data<AppState>,
    blog_id: i32,
    payload: BlogPayload,
    partial: bool,
) -> Result<HttpResponse, AppError> {
    let (title, content) = if partial {
        (payload.title, payload.content)
    } else {
        (
            Some(required("title", payload.title)?),
            Some(required("content", payload.content)?),
        )
    };
    let title = title.map(validate_title).transpose()?;
    let content = content.map(|c| not_blank("content", c)).transpose()?;

    let mut conn = app_state.conn()?;
    let mut blog = Blog::get_by_id(&mut conn, blog_id)?;
    blog.edit(&mut conn, title, content)?;

    Ok(HttpResponse::Ok().json(BlogResponse::build(&blog, &mut conn)?))
}

/// Pipe for replacing a blog's title and content
/// - url: `{domain}/blogs/{id}/`
///
/// Any authenticated user may edit any blog, ownership is not checked.
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
/// ## body
/// - json with `title` and `content`
///
/// # Response
/// ## Ok
/// - the updated blog, `updated_at` moved forward
/// ## Error
/// - Unauthorized
/// - Not found
/// - Bad request
pub async fn update_blog(
    app_state: Data<AppState>,
    _caller: Caller,
    blog_id: Path<i32>,
    payload: Json<BlogPayload>,
) -> Result<HttpResponse, AppError> {
    save_blog(app_state, blog_id.into_inner(), payload.into_inner(), false).await
}

/// Same as [update_blog] with every field optional
pub async fn partial_update_blog(
    app_state: Data<AppState>,
    _caller: Caller,
    blog_id: Path<i32>,
    payload: Json<BlogPayload>,
) -> Result<HttpResponse, AppError> {
    save_blog(app_state, blog_id.into_inner(), payload.into_inner(), true).await
}

/// Pipe for deleting a blog with its comments and likes
/// - url: `{domain}/blogs/{id}/`
///
/// # Response
/// ## No content
/// ## Error
/// - Unauthorized
/// - Not found
pub async fn destroy_blog(
    app_state: Data<AppState>,
    caller: Caller,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    if Blog::delete_by_id(&mut conn, *blog_id)? == 0 {
        return Err(AppError::NotFound);
    }
    log::info!("{} deleted blog {}", caller.user.username, blog_id);

    Ok(HttpResponse::NoContent().finish())
}

/// Pipe for liking a blog as the caller, liking twice is not an error
/// - url: `{domain}/blogs/{id}/like/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
///
/// # Response
/// ## Ok
/// ```
/// { "status": "blog liked" }
/// ```
/// or, when the like already existed
/// ```
/// { "status": "blog already liked" }
/// ```
/// ## Error
/// - Unauthorized
/// - Not found
pub async fn like_blog(
    app_state: Data<AppState>,
    caller: Caller,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    if !Blog::exists(&mut conn, *blog_id)? {
        return Err(AppError::NotFound);
    }

    let (_like, created) = Like::get_or_create(&mut conn, caller.id(), *blog_id)?;
    let status = if created { "blog liked" } else { "blog already liked" };
    log::info!("{} liked blog {}: {status}", caller.user.username, blog_id);

    Ok(HttpResponse::Ok().json(StatusResponse::new(status)))
}

/// Pipe for removing the caller's like from a blog
/// - url: `{domain}/blogs/{id}/unlike/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
///
/// # Response
/// ## Ok
/// ```
/// { "status": "blog unliked" }
/// ```
/// ## Bad request, the caller had not liked the blog
/// ```
/// { "status": "blog not liked" }
/// ```
/// ## Error
/// - Unauthorized
/// - Not found
pub async fn unlike_blog(
    app_state: Data<AppState>,
    caller: Caller,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    if !Blog::exists(&mut conn, *blog_id)? {
        return Err(AppError::NotFound);
    }

    if Like::delete_for(&mut conn, caller.id(), *blog_id)? == 0 {
        return Ok(HttpResponse::BadRequest().json(StatusResponse::new("blog not liked")));
    }
    log::info!("{} unliked blog {}", caller.user.username, blog_id);

    Ok(HttpResponse::Ok().json(StatusResponse::new("blog unliked")))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::StatusCode,
        test::{self, call_service, read_body_json},
        App,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        database::models::user::User,
        pagination::Page,
        routes::{configure, test_support::*},
    };

    fn seed_blogs(app_state: &AppState, author: &User, n: usize) {
        let mut conn = app_state.conn().unwrap();
        for i in 0..n {
            Blog::new(&mut conn, author, &format!("Blog {i}"), "Body").unwrap();
        }
    }

    #[actix_rt::test]
    async fn test_blog_create_forces_author() {
        let state = test_state();
        let (alice, access) = signup(&state, "alice");
        let (bob, _) = signup(&state, "bob");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/blogs/")
            .insert_header(bearer(&access))
            .set_json(json!({ "title": "Hi", "content": "Body", "author": bob.id }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let blog: BlogResponse = read_body_json(resp).await;
        assert_eq!(blog.author.id, alice.id);
        assert_eq!(blog.likes_count, 0);
        assert_eq!(blog.comments_count, 0);
        assert_eq!(blog.created_at, blog.updated_at);
    }

    #[actix_rt::test]
    async fn test_blog_create_validation() {
        let state = test_state();
        let (_alice, access) = signup(&state, "alice");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let bad_payloads = [
            json!({ "content": "Body" }),
            json!({ "title": "Hi" }),
            json!({ "title": "  ", "content": "Body" }),
            json!({ "title": "x".repeat(201), "content": "Body" }),
        ];
        for payload in bad_payloads {
            let req = test::TestRequest::post()
                .uri("/blogs/")
                .insert_header(bearer(&access))
                .set_json(&payload)
                .to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::post()
            .uri("/blogs/")
            .insert_header(bearer(&access))
            .set_json(json!({ "title": "x".repeat(200), "content": "Body" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    #[actix_rt::test]
    async fn test_blog_requires_authentication() {
        let state = test_state();
        let (alice, _) = signup(&state, "alice");
        seed_blogs(&state, &alice, 1);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/blogs/").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key("www-authenticate"));

        let req = test::TestRequest::post()
            .uri("/blogs/")
            .set_json(json!({ "title": "Hi", "content": "Body" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Blog::count(&mut state.conn().unwrap()).unwrap(), 1);
    }

    #[actix_rt::test]
    async fn test_blog_list_page_size_is_capped() {
        let state = test_state();
        let (alice, access) = signup(&state, "alice");
        seed_blogs(&state, &alice, 150);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        for page_size in [100, 200] {
            let req = test::TestRequest::get()
                .uri(&format!("/blogs/?page_size={page_size}"))
                .insert_header(bearer(&access))
                .to_request();
            let page: Page<BlogResponse> = test::call_and_read_body_json(&app, req).await;
            assert_eq!(page.count, 150);
            assert_eq!(page.results.len(), 100);
            assert!(page.next.is_some());
            assert_eq!(page.previous, None);
        }

        let req = test::TestRequest::get()
            .uri("/blogs/")
            .insert_header(bearer(&access))
            .to_request();
        let page: Page<BlogResponse> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.results.len(), 10);
        assert_eq!(page.results[0].title, "Blog 149");

        let req = test::TestRequest::get()
            .uri("/blogs/?page=last")
            .insert_header(bearer(&access))
            .to_request();
        let page: Page<BlogResponse> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.results.len(), 10);
        assert_eq!(page.next, None);

        let req = test::TestRequest::get()
            .uri("/blogs/?page=16")
            .insert_header(bearer(&access))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_blog_update_by_anyone() {
        let state = test_state();
        let (alice, _) = signup(&state, "alice");
        let (_bob, bob_access) = signup(&state, "bob");
        seed_blogs(&state, &alice, 1);
        let blog = Blog::page(&mut state.conn().unwrap(), 1, 0).unwrap().remove(0);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/blogs/{}/", blog.id))
            .insert_header(bearer(&bob_access))
            .set_json(json!({ "title": "Edited" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/blogs/{}/", blog.id))
            .insert_header(bearer(&bob_access))
            .set_json(json!({ "title": "Edited" }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let updated: BlogResponse = read_body_json(resp).await;
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.content, "Body");
        assert_eq!(updated.author.id, alice.id);
        assert!(updated.updated_at >= blog.updated_at);
    }

    #[actix_rt::test]
    async fn test_blog_missing() {
        let state = test_state();
        let (_alice, access) = signup(&state, "alice");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let requests = [
            test::TestRequest::get().uri("/blogs/42/"),
            test::TestRequest::delete().uri("/blogs/42/"),
            test::TestRequest::post().uri("/blogs/42/like/"),
            test::TestRequest::post().uri("/blogs/42/unlike/"),
        ];
        for req in requests {
            let req = req.insert_header(bearer(&access)).to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body: Value = read_body_json(resp).await;
            assert_eq!(body, json!({ "detail": "Not found." }));
        }
    }

    #[actix_rt::test]
    async fn test_blog_likes_count_follows_toggles() {
        let state = test_state();
        let (alice, alice_access) = signup(&state, "alice");
        let (_bob, bob_access) = signup(&state, "bob");
        seed_blogs(&state, &alice, 1);
        let blog_id = Blog::page(&mut state.conn().unwrap(), 1, 0).unwrap()[0].id;
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        for access in [&alice_access, &bob_access, &bob_access] {
            let req = test::TestRequest::post()
                .uri(&format!("/blogs/{blog_id}/like/"))
                .insert_header(bearer(access))
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/blogs/{blog_id}/"))
            .insert_header(bearer(&alice_access))
            .to_request();
        let blog: BlogResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(blog.likes_count, 2);
    }
}
