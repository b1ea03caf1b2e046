use std::sync::Arc;

use axum::{
    Form,
    extract::{FromRef, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::Key;
use tracing::{error, info};

use warbler_db::{Database, DbError};
use warbler_types::forms::{LoginForm, SignupForm};

use crate::error::{WebError, form_or_default};
use crate::session::{CurrentUser, Flash, Session};
use crate::templates::{Layout, LoginTemplate, SignupTemplate, render};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// Encrypts and signs the session cookies.
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(db: Database, cookie_key: Key) -> Self {
        Self {
            db: Arc::new(db),
            cookie_key,
        }
    }

    /// Run blocking database work off the async runtime.
    pub async fn blocking<F, T>(&self, f: F) -> Result<T, WebError>
    where
        F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let value = tokio::task::spawn_blocking(move || f(&db))
            .await
            .inspect_err(|e| error!("spawn_blocking join error: {}", e))??;
        Ok(value)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub async fn signup_form(session: Session, CurrentUser(user): CurrentUser) -> Result<Response, WebError> {
    let (session, flashes) = session.take_flashes();
    let page = SignupTemplate {
        layout: Layout::new(user, flashes),
        username: String::new(),
        email: String::new(),
        image_url: String::new(),
        errors: vec![],
    };
    Ok((session, render(&page)?).into_response())
}

/// POST /signup: create the user and log them in.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Result<Response, WebError> {
    let form = form_or_default(form);
    let mut errors = validate_signup(&form);

    if errors.is_empty() {
        let username = form.username.trim().to_string();
        let email = form.email.trim().to_string();
        let password = form.password.clone();
        let image_url = form.image_url.clone();

        let created = state
            .blocking(move |db| match db.signup(&username, &email, &password, image_url.as_deref()) {
                Ok(user) => Ok(Some(user)),
                Err(DbError::Integrity(_)) => Ok(None),
                Err(e) => Err(e),
            })
            .await?;

        match created {
            Some(new_user) => {
                info!("New user {} signed up", new_user.username);
                return Ok((session.login(new_user.id), Redirect::to("/")).into_response());
            }
            None => errors.push("Username already taken".to_string()),
        }
    }

    let (session, flashes) = session.take_flashes();
    let page = SignupTemplate {
        layout: Layout::new(user, flashes),
        username: form.username,
        email: form.email,
        image_url: form.image_url.unwrap_or_default(),
        errors,
    };
    Ok((session, render(&page)?).into_response())
}

fn validate_signup(form: &SignupForm) -> Vec<String> {
    let mut errors = vec![];
    if form.username.trim().is_empty() {
        errors.push("Username is required.".to_string());
    }
    if !form.email.contains('@') {
        errors.push("Invalid email address.".to_string());
    }
    if form.password.len() < 6 {
        errors.push("Password must be at least 6 characters.".to_string());
    }
    errors
}

pub async fn login_form(session: Session, CurrentUser(user): CurrentUser) -> Result<Response, WebError> {
    let (session, flashes) = session.take_flashes();
    let page = LoginTemplate {
        layout: Layout::new(user, flashes),
        username: String::new(),
    };
    Ok((session, render(&page)?).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, WebError> {
    let form = form_or_default(form);
    let username = form.username.clone();
    let password = form.password;
    let found = state
        .blocking(move |db| db.authenticate(&username, &password))
        .await?;

    if let Some(found) = found {
        let greeting = format!("Hello, {}!", found.username);
        let session = session.login(found.id).flash("success", greeting);
        return Ok((session, Redirect::to("/")).into_response());
    }

    let (session, mut flashes) = session.take_flashes();
    flashes.push(Flash::new("danger", "Invalid credentials."));
    let page = LoginTemplate {
        layout: Layout::new(user, flashes),
        username: form.username,
    };
    Ok((session, render(&page)?).into_response())
}

pub async fn logout(session: Session) -> impl IntoResponse {
    let session = session
        .logout()
        .flash("success", "You have successfully logged out.");
    (session, Redirect::to("/login"))
}
