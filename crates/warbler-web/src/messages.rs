use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info, warn};

use warbler_db::models::MessageRow;
use warbler_types::forms::MessageForm;
use warbler_types::models::{MAX_MESSAGE_LEN, Message};

use crate::auth::AppState;
use crate::error::{WebError, form_or_default};
use crate::session::{CurrentUser, Session, access_unauthorized};
use crate::templates::{Layout, MessageCard, MessageShowTemplate, NewMessageTemplate, render};

enum DeleteOutcome {
    Missing,
    NotOwner,
    Deleted,
}

enum LikeOutcome {
    Missing,
    OwnMessage,
    Toggled(bool),
}

pub(crate) fn message_cards(
    rows: Vec<MessageRow>,
    viewer_id: Option<i64>,
    liked: &[i64],
) -> Vec<MessageCard> {
    rows.into_iter()
        .map(|row| {
            let liked = liked.contains(&row.id);
            let can_like = viewer_id.is_some_and(|id| id != row.user_id);
            MessageCard {
                message: Message::from(row),
                liked,
                can_like,
            }
        })
        .collect()
}

fn validate_text(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        vec!["Message text is required.".to_string()]
    } else if text.chars().count() > MAX_MESSAGE_LEN {
        vec![format!("Messages are limited to {MAX_MESSAGE_LEN} characters.")]
    } else {
        vec![]
    }
}

/// GET /messages/new
pub async fn new_message_form(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let (session, flashes) = session.take_flashes();
    let page = NewMessageTemplate {
        layout: Layout::new(Some(me), flashes),
        text: String::new(),
        errors: vec![],
    };
    Ok((session, render(&page)?).into_response())
}

/// POST /messages/new
///
/// The session is checked before the form is even read, so logged-out posts
/// without a body still get the unauthorized redirect.
pub async fn create_message(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    form: Result<Form<MessageForm>, FormRejection>,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let text = form_or_default(form).text;

    let errors = validate_text(&text);
    if !errors.is_empty() {
        let (session, flashes) = session.take_flashes();
        let page = NewMessageTemplate {
            layout: Layout::new(Some(me), flashes),
            text,
            errors,
        };
        return Ok((session, render(&page)?).into_response());
    }

    let user_id = me.id;
    let message = state
        .blocking(move |db| db.insert_message(user_id, &text))
        .await?;
    info!("User {} posted message {}", user_id, message.id);

    Ok((session, Redirect::to(&format!("/users/{user_id}"))).into_response())
}

/// GET /messages/{message_id}
pub async fn show_message(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, WebError> {
    let viewer_id = user.as_ref().map(|u| u.id);
    let (row, liked) = state
        .blocking(move |db| {
            let Some(row) = db.get_message(message_id)? else {
                return Ok(None);
            };
            let liked = match viewer_id {
                Some(id) => db.liked_message_ids(id)?,
                None => vec![],
            };
            Ok(Some((row, liked)))
        })
        .await?
        .ok_or_else(|| WebError::NotFound(user.clone()))?;

    let is_mine = viewer_id == Some(row.user_id);
    let card = message_cards(vec![row], viewer_id, &liked)
        .pop()
        .ok_or_else(|| WebError::NotFound(user.clone()))?;

    let (session, flashes) = session.take_flashes();
    let page = MessageShowTemplate {
        layout: Layout::new(user, flashes),
        card,
        is_mine,
    };
    Ok((session, render(&page)?).into_response())
}

/// POST /messages/{message_id}/delete: only the author may delete.
pub async fn delete_message(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let user_id = me.id;
    let outcome = state
        .blocking(move |db| {
            let Some(message) = db.get_message(message_id)? else {
                return Ok(DeleteOutcome::Missing);
            };
            if message.user_id != user_id {
                return Ok(DeleteOutcome::NotOwner);
            }
            db.delete_message(message_id)?;
            Ok(DeleteOutcome::Deleted)
        })
        .await?;

    match outcome {
        DeleteOutcome::Missing => Err(WebError::NotFound(Some(me))),
        DeleteOutcome::NotOwner => {
            warn!("User {} tried to delete message {} they do not own", user_id, message_id);
            Ok(access_unauthorized(session))
        }
        DeleteOutcome::Deleted => {
            info!("User {} deleted message {}", user_id, message_id);
            Ok((session, Redirect::to(&format!("/users/{user_id}"))).into_response())
        }
    }
}

/// POST /messages/{message_id}/like: like, or unlike if already liked.
pub async fn toggle_like(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let user_id = me.id;
    let outcome = state
        .blocking(move |db| {
            let Some(message) = db.get_message(message_id)? else {
                return Ok(LikeOutcome::Missing);
            };
            if message.user_id == user_id {
                return Ok(LikeOutcome::OwnMessage);
            }
            Ok(LikeOutcome::Toggled(db.toggle_like(user_id, message_id)?))
        })
        .await?;

    let session = match outcome {
        LikeOutcome::Missing => return Err(WebError::NotFound(Some(me))),
        LikeOutcome::OwnMessage => session.flash("danger", "You cannot like your own message."),
        LikeOutcome::Toggled(added) => {
            debug!("User {} like on message {}: {}", user_id, message_id, added);
            session
        }
    };
    Ok((session, Redirect::to("/")).into_response())
}
