use axum::{
    Form,
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};
use warbler_db::DbError;
use warbler_types::models::User;

use crate::templates::{Layout, NotFoundTemplate, render};

#[derive(Debug, Error)]
pub enum WebError {
    /// Carries the viewer so the 404 page keeps their nav bar.
    #[error("not found")]
    NotFound(Option<User>),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("spawn_blocking join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound(viewer) => not_found_page(Layout::new(viewer, vec![])),
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// The 404 page, falling back to plain text if the template itself fails.
pub fn not_found_page(layout: Layout) -> Response {
    let page = render(&NotFoundTemplate { layout }).unwrap_or_else(|e| {
        error!("Failed to render 404 page: {}", e);
        Html("Page not found".to_string())
    });
    (StatusCode::NOT_FOUND, page).into_response()
}

/// An unreadable form body counts as an empty form, so handlers still run
/// their session checks and validation.
pub(crate) fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Unreadable form: {}", rejection);
            T::default()
        }
    }
}
