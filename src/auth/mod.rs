pub mod password;
pub mod token;

use actix_web::{
    dev::Payload,
    http::header::{self, Header},
    web::Data,
    FromRequest, HttpRequest,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::{ready, Ready};

use crate::{
    app::{AppError, AppState},
    database::models::user::User,
};
use token::TokenKind;

/// The user behind a verified access token.
///
/// Taking a `Caller` argument is what makes a handler require
/// authentication: the extractor rejects the request with a 401 before the
/// handler runs when the `Authorization: Bearer <access token>` header is
/// missing, the token does not verify, or its user no longer exists.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
}

impl Caller {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Caller, AppError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Err(AppError::authentication(
            "Authentication credentials were not provided.",
        ));
    }
    let credentials = Authorization::<Bearer>::parse(req)
        .map_err(|_| AppError::authentication("Authorization header must be `Bearer <token>`."))?
        .into_scheme();

    let app_state = req.app_data::<Data<AppState>>().ok_or_else(|| {
        log::error!("AppState missing from the application data");
        AppError::InternalServerError
    })?;

    let claims = app_state
        .tokens
        .verify(credentials.token(), TokenKind::Access)
        .map_err(|err| {
            log::debug!("rejected bearer token: {err}");
            AppError::authentication("Given token not valid for any token type")
        })?;

    let mut conn = app_state.conn()?;
    let user = User::find_by_id(&mut conn, &claims.sub)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => AppError::authentication("User not found"),
            err => AppError::from(err),
        })?;

    Ok(Caller { user })
}
