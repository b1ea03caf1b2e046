use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::auth::AppState;
use crate::error::{WebError, not_found_page};
use crate::messages::message_cards;
use crate::session::{CurrentUser, Flash, Session};
use crate::templates::{AnonHomeTemplate, HomeTemplate, Layout, ProfileHeader, render};

const TIMELINE_LIMIT: u32 = 100;

/// GET /: the timeline for logged-in users, the landing page otherwise.
pub async fn homepage(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, WebError> {
    let (session, flashes) = session.take_flashes();

    let Some(user) = user else {
        let page = AnonHomeTemplate {
            layout: Layout::new(None, flashes),
        };
        return Ok((session, render(&page)?).into_response());
    };

    let user_id = user.id;
    let (stats, rows, liked) = state
        .blocking(move |db| {
            Ok((
                db.user_stats(user_id)?,
                db.timeline(user_id, TIMELINE_LIMIT)?,
                db.liked_message_ids(user_id)?,
            ))
        })
        .await?;

    let page = HomeTemplate {
        profile: ProfileHeader {
            user: user.clone(),
            stats,
            followed: false,
            is_me: true,
            logged_in: true,
        },
        messages: message_cards(rows, Some(user_id), &liked),
        layout: Layout::new(Some(user), flashes),
    };
    Ok((session, render(&page)?).into_response())
}

/// Fallback for unknown routes. Anonymous visitors also get the unauthorized
/// notice, since most of the site needs a login.
pub async fn not_found(session: Session, CurrentUser(user): CurrentUser) -> Response {
    let (session, mut flashes) = session.take_flashes();
    if user.is_none() {
        flashes.push(Flash::unauthorized());
    }
    (session, not_found_page(Layout::new(user, flashes))).into_response()
}
