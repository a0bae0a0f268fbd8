use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use super::required;
use crate::{
    app::{AppError, AppState},
    auth::Caller,
    database::models::{blog::Blog, like::Like, user::User},
    responses::LikeResponse,
};

#[derive(Debug, Default, Deserialize)]
pub struct LikePayload {
    pub blog: Option<i32>,
    pub user: Option<String>,
}

fn check_refs(
    conn: &mut SqliteConnection,
    blog_id: Option<i32>,
    user_id: Option<&str>,
) -> Result<(), AppError> {
    if let Some(blog_id) = blog_id {
        if !Blog::exists(conn, blog_id)? {
            return Err(AppError::validation(format!(
                "blog: Invalid pk \"{blog_id}\" - object does not exist."
            )));
        }
    }
    if let Some(user_id) = user_id {
        match User::find_by_id(conn, user_id) {
            Ok(_) => {}
            Err(diesel::result::Error::NotFound) => {
                return Err(AppError::validation(format!(
                    "user: Invalid pk \"{user_id}\" - object does not exist."
                )))
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Pipe for listing every like, oldest first
/// - url: `{domain}/likes/`
pub async fn list_likes(
    app_state: Data<AppState>,
    _caller: Caller,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let likes: Vec<LikeResponse> = Like::all(&mut conn)?.iter().map(LikeResponse::from).collect();

    Ok(HttpResponse::Ok().json(likes))
}

/// Pipe for recording a like on behalf of any user
/// - url: `{domain}/likes/`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <access token>`
/// ## body
/// - json with `blog` (id) and `user` (id)
///
/// # Response
/// ## Created
/// ```
/// { "id": 1, "blog": 1, "user": "e60a0f7b-381c-46b7-8736-1f204b329727" }
/// ```
/// ## Error
/// - Unauthorized
/// - Bad request, the blog or the user does not exist
/// - Conflict, the user already likes the blog
pub async fn create_like(
    app_state: Data<AppState>,
    _caller: Caller,
    payload: Json<LikePayload>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let blog_id = required("blog", payload.blog)?;
    let user_id = required("user", payload.user)?;

    let mut conn = app_state.conn()?;
    check_refs(&mut conn, Some(blog_id), Some(&user_id))?;
    let like = Like::new(&mut conn, &user_id, blog_id)?;

    Ok(HttpResponse::Created().json(LikeResponse::from(&like)))
}

/// Pipe for getting one like
/// - url: `{domain}/likes/{id}/`
pub async fn retrieve_like(
    app_state: Data<AppState>,
    _caller: Caller,
    like_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    let like = Like::find_by_id(&mut conn, *like_id)?;

    Ok(HttpResponse::Ok().json(LikeResponse::from(&like)))
}

async fn save_like(
    app_state: Data<AppState>,
    like_id: i32,
    payload: LikePayload,
    partial: bool,
) -> Result<HttpResponse, AppError> {
    let (blog_id, user_id) = if partial {
        (payload.blog, payload.user)
    } else {
        (
            Some(required("blog", payload.blog)?),
            Some(required("user", payload.user)?),
        )
    };

    let mut conn = app_state.conn()?;
    let mut like = Like::find_by_id(&mut conn, like_id)?;
    check_refs(&mut conn, blog_id, user_id.as_deref())?;
    like.edit(&mut conn, blog_id, user_id)?;

    Ok(HttpResponse::Ok().json(LikeResponse::from(&like)))
}

/// Pipe for replacing a like's blog and user
/// - url: `{domain}/likes/{id}/`
///
/// # Response
/// ## Ok
/// ## Error
/// - Unauthorized
/// - Not found
/// - Bad request
/// - Conflict, the new pair is already liked
pub async fn update_like(
    app_state: Data<AppState>,
    _caller: Caller,
    like_id: Path<i32>,
    payload: Json<LikePayload>,
) -> Result<HttpResponse, AppError> {
    save_like(app_state, like_id.into_inner(), payload.into_inner(), false).await
}

/// Same as [update_like] with every field optional
pub async fn partial_update_like(
    app_state: Data<AppState>,
    _caller: Caller,
    like_id: Path<i32>,
    payload: Json<LikePayload>,
) -> Result<HttpResponse, AppError> {
    save_like(app_state, like_id.into_inner(), payload.into_inner(), true).await
}

/// Pipe for deleting a like
/// - url: `{domain}/likes/{id}/`
pub async fn destroy_like(
    app_state: Data<AppState>,
    _caller: Caller,
    like_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut conn = app_state.conn()?;
    if Like::delete_by_id(&mut conn, *like_id)? == 0 {
        return Err(AppError::NotFound);
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::StatusCode,
        test::{self, call_service, read_body_json},
        App,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::routes::{configure, test_support::*};

    #[actix_rt::test]
    async fn test_like_create_and_list() {
        let state = test_state();
        let (alice, access) = signup(&state, "alice");
        let (bob, _) = signup(&state, "bob");
        let blog = Blog::new(&mut state.conn().unwrap(), &alice, "Hi", "Body").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        for user in [&bob, &alice] {
            let req = test::TestRequest::post()
                .uri("/likes/")
                .insert_header(bearer(&access))
                .set_json(json!({ "blog": blog.id, "user": user.id }))
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/likes/")
            .insert_header(bearer(&access))
            .to_request();
        let likes: Vec<LikeResponse> = test::call_and_read_body_json(&app, req).await;
        let users: Vec<&str> = likes.iter().map(|l| l.user.as_str()).collect();
        assert_eq!(users, vec![bob.id.as_str(), alice.id.as_str()]);
    }

    #[actix_rt::test]
    async fn test_like_create_rejects_bad_refs_and_duplicates() {
        let state = test_state();
        let (alice, access) = signup(&state, "alice");
        let blog = Blog::new(&mut state.conn().unwrap(), &alice, "Hi", "Body").unwrap();
        Like::new(&mut state.conn().unwrap(), &alice.id, blog.id).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let cases = [
            (json!({ "blog": 99, "user": alice.id }), StatusCode::BAD_REQUEST),
            (json!({ "blog": blog.id, "user": "nobody" }), StatusCode::BAD_REQUEST),
            (json!({ "blog": blog.id }), StatusCode::BAD_REQUEST),
            (json!({ "blog": blog.id, "user": alice.id }), StatusCode::CONFLICT),
        ];
        for (payload, status) in cases {
            let req = test::TestRequest::post()
                .uri("/likes/")
                .insert_header(bearer(&access))
                .set_json(&payload)
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), status, "{payload}");
        }
        assert_eq!(Like::count_for_blog(&mut state.conn().unwrap(), blog.id).unwrap(), 1);
    }

    #[actix_rt::test]
    async fn test_like_update_and_delete() {
        let state = test_state();
        let (alice, access) = signup(&state, "alice");
        let (bob, _) = signup(&state, "bob");
        let blog = Blog::new(&mut state.conn().unwrap(), &alice, "Hi", "Body").unwrap();
        let like = Like::new(&mut state.conn().unwrap(), &alice.id, blog.id).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri(&format!("/likes/{}/", like.id))
            .insert_header(bearer(&access))
            .set_json(json!({ "user": bob.id }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: LikeResponse = read_body_json(resp).await;
        assert_eq!(updated, LikeResponse { id: like.id, blog: blog.id, user: bob.id.clone() });

        let req = test::TestRequest::put()
            .uri(&format!("/likes/{}/", like.id))
            .insert_header(bearer(&access))
            .set_json(json!({ "user": alice.id }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete()
            .uri(&format!("/likes/{}/", like.id))
            .insert_header(bearer(&access))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri(&format!("/likes/{}/", like.id))
            .insert_header(bearer(&access))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
