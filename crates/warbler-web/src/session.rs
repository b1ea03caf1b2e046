use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, IntoResponseParts, Redirect, Response, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use warbler_types::models::User;

use crate::auth::AppState;
use crate::error::WebError;

/// Session key holding the logged-in user's id.
pub const CURR_USER_KEY: &str = "curr_user";

const FLASH_COOKIE: &str = "_flashes";

pub const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";

/// A one-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn new(category: &str, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new("danger", ACCESS_UNAUTHORIZED)
    }
}

/// Request session backed by encrypted cookies.
///
/// Mutators consume and return the session; hand it back in the response so
/// the cookie changes reach the browser.
pub struct Session {
    jar: PrivateCookieJar,
}

impl Session {
    pub fn new(key: Key) -> Self {
        Self {
            jar: PrivateCookieJar::new(key),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        let cookie = self.jar.get(CURR_USER_KEY)?;
        match cookie.value().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring malformed session user id '{}'", cookie.value());
                None
            }
        }
    }

    pub fn login(self, user_id: i64) -> Self {
        Self {
            jar: self.jar.add(session_cookie(CURR_USER_KEY, user_id.to_string())),
        }
    }

    pub fn logout(self) -> Self {
        Self {
            jar: self.jar.remove(Cookie::build(CURR_USER_KEY).path("/")),
        }
    }

    pub fn flash(self, category: &str, message: impl Into<String>) -> Self {
        let mut flashes = self.pending_flashes();
        flashes.push(Flash::new(category, message));

        match serde_json::to_string(&flashes) {
            Ok(value) => Self {
                jar: self.jar.add(session_cookie(FLASH_COOKIE, value)),
            },
            Err(e) => {
                warn!("Dropping flash message: {}", e);
                self
            }
        }
    }

    /// Pending flashes, cleared from the session.
    pub fn take_flashes(self) -> (Self, Vec<Flash>) {
        let flashes = self.pending_flashes();
        if flashes.is_empty() {
            return (self, flashes);
        }

        let jar = self.jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
        (Self { jar }, flashes)
    }

    fn pending_flashes(&self) -> Vec<Flash> {
        self.jar
            .get(FLASH_COOKIE)
            .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
            .unwrap_or_default()
    }
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;
        Ok(Self { jar })
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.jar.into_response_parts(res)
    }
}

/// The user named by the session, if that user still exists.
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await;
        let Some(user_id) = session.user_id() else {
            return Ok(Self(None));
        };

        let user = state.blocking(move |db| db.get_user(user_id)).await?;
        if user.is_none() {
            debug!("Session refers to missing user {}", user_id);
        }
        Ok(Self(user.map(User::from)))
    }
}

/// Flash the unauthorized notice and send the visitor home.
pub fn access_unauthorized(session: Session) -> Response {
    (session.flash("danger", ACCESS_UNAUTHORIZED), Redirect::to("/")).into_response()
}
