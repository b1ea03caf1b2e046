use axum::{
    Form,
    extract::{Path, Query, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use warbler_db::models::{ProfileUpdate, UserRow};
use warbler_db::{Database, DbError};
use warbler_types::forms::{ProfileForm, SearchQuery};
use warbler_types::models::User;

use crate::auth::AppState;
use crate::error::{WebError, form_or_default, not_found_page};
use crate::messages::message_cards;
use crate::session::{CurrentUser, Flash, Session, access_unauthorized};
use crate::templates::{
    EditProfileTemplate, FollowListTemplate, Layout, LikesTemplate, ProfileHeader, UserCard,
    UserIndexTemplate, UserShowTemplate, render,
};

const PROFILE_MESSAGE_LIMIT: u32 = 100;

#[derive(Clone, Copy)]
enum FollowList {
    Following,
    Followers,
}

enum ProfileOutcome {
    WrongPassword,
    Taken,
    Updated,
}

fn following_ids(db: &Database, user_id: i64) -> warbler_db::Result<Vec<i64>> {
    Ok(db.following(user_id)?.into_iter().map(|u| u.id).collect())
}

fn load_profile(
    db: &Database,
    viewer_id: Option<i64>,
    user_id: i64,
) -> warbler_db::Result<Option<ProfileHeader>> {
    let Some(row) = db.get_user(user_id)? else {
        return Ok(None);
    };
    let stats = db.user_stats(user_id)?;
    let followed = match viewer_id {
        Some(viewer) => db.is_following(viewer, user_id)?,
        None => false,
    };

    Ok(Some(ProfileHeader {
        user: User::from(row),
        stats,
        followed,
        is_me: viewer_id == Some(user_id),
        logged_in: viewer_id.is_some(),
    }))
}

fn user_cards(rows: Vec<UserRow>, viewer_id: Option<i64>, followed_ids: &[i64]) -> Vec<UserCard> {
    rows.into_iter()
        .map(|row| UserCard {
            followed: followed_ids.contains(&row.id),
            can_follow: viewer_id.is_some_and(|id| id != row.id),
            user: User::from(row),
        })
        .collect()
}

/// GET /users?q=: the user directory, optionally filtered by username.
pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Response, WebError> {
    let viewer_id = user.as_ref().map(|u| u.id);
    let q = query.q.unwrap_or_default();

    let search = q.clone();
    let (rows, followed) = state
        .blocking(move |db| {
            let rows = db.search_users(Some(&search))?;
            let followed = match viewer_id {
                Some(id) => following_ids(db, id)?,
                None => vec![],
            };
            Ok((rows, followed))
        })
        .await?;

    let (session, flashes) = session.take_flashes();
    let page = UserIndexTemplate {
        layout: Layout::new(user, flashes),
        q,
        users: user_cards(rows, viewer_id, &followed),
    };
    Ok((session, render(&page)?).into_response())
}

/// GET /users/{user_id}: public profile with the newest messages.
pub async fn show_user(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    let viewer_id = user.as_ref().map(|u| u.id);
    let (profile, rows, liked) = state
        .blocking(move |db| {
            let Some(profile) = load_profile(db, viewer_id, user_id)? else {
                return Ok(None);
            };
            let rows = db.messages_for_user(user_id, PROFILE_MESSAGE_LIMIT)?;
            let liked = match viewer_id {
                Some(id) => db.liked_message_ids(id)?,
                None => vec![],
            };
            Ok(Some((profile, rows, liked)))
        })
        .await?
        .ok_or_else(|| WebError::NotFound(user.clone()))?;

    let (session, flashes) = session.take_flashes();
    let page = UserShowTemplate {
        layout: Layout::new(user, flashes),
        profile,
        messages: message_cards(rows, viewer_id, &liked),
    };
    Ok((session, render(&page)?).into_response())
}

/// GET /users/{user_id}/following
pub async fn show_following(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    follow_list(state, session, user, user_id, FollowList::Following).await
}

/// GET /users/{user_id}/followers
pub async fn show_followers(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    follow_list(state, session, user, user_id, FollowList::Followers).await
}

/// Any logged-in user may browse anyone's lists. Logged-out visitors get a
/// 404 carrying the unauthorized notice rather than the redirect the other
/// pages use.
async fn follow_list(
    state: AppState,
    session: Session,
    viewer: Option<User>,
    user_id: i64,
    list: FollowList,
) -> Result<Response, WebError> {
    let Some(viewer) = viewer else {
        let (session, mut flashes) = session.take_flashes();
        flashes.push(Flash::unauthorized());
        return Ok((session, not_found_page(Layout::new(None, flashes))).into_response());
    };

    let viewer_id = viewer.id;
    let (profile, rows, followed) = state
        .blocking(move |db| {
            let Some(profile) = load_profile(db, Some(viewer_id), user_id)? else {
                return Ok(None);
            };
            let rows = match list {
                FollowList::Following => db.following(user_id)?,
                FollowList::Followers => db.followers(user_id)?,
            };
            Ok(Some((profile, rows, following_ids(db, viewer_id)?)))
        })
        .await?
        .ok_or_else(|| WebError::NotFound(Some(viewer.clone())))?;

    let heading = match list {
        FollowList::Following => "Following",
        FollowList::Followers => "Followers",
    };

    let (session, flashes) = session.take_flashes();
    let page = FollowListTemplate {
        layout: Layout::new(Some(viewer), flashes),
        profile,
        heading,
        users: user_cards(rows, Some(viewer_id), &followed),
    };
    Ok((session, render(&page)?).into_response())
}

/// GET /users/{user_id}/likes
pub async fn show_likes(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    let Some(viewer) = user else {
        return Ok(access_unauthorized(session));
    };

    let viewer_id = viewer.id;
    let (profile, rows, liked) = state
        .blocking(move |db| {
            let Some(profile) = load_profile(db, Some(viewer_id), user_id)? else {
                return Ok(None);
            };
            let rows = db.liked_messages(user_id)?;
            Ok(Some((profile, rows, db.liked_message_ids(viewer_id)?)))
        })
        .await?
        .ok_or_else(|| WebError::NotFound(Some(viewer.clone())))?;

    let (session, flashes) = session.take_flashes();
    let page = LikesTemplate {
        layout: Layout::new(Some(viewer), flashes),
        profile,
        messages: message_cards(rows, Some(viewer_id), &liked),
    };
    Ok((session, render(&page)?).into_response())
}

/// POST /users/follow/{user_id}
pub async fn follow(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let my_id = me.id;
    if my_id == user_id {
        let session = session.flash("danger", "You cannot follow yourself.");
        return Ok((session, Redirect::to(&format!("/users/{my_id}"))).into_response());
    }

    let found = state
        .blocking(move |db| {
            if db.get_user(user_id)?.is_none() {
                return Ok(false);
            }
            db.follow(my_id, user_id)?;
            Ok(true)
        })
        .await?;
    if !found {
        return Err(WebError::NotFound(Some(me)));
    }

    Ok((session, Redirect::to(&format!("/users/{my_id}/following"))).into_response())
}

/// POST /users/stop-following/{user_id}
pub async fn stop_following(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let my_id = me.id;
    let found = state
        .blocking(move |db| {
            if db.get_user(user_id)?.is_none() {
                return Ok(false);
            }
            db.unfollow(my_id, user_id)?;
            Ok(true)
        })
        .await?;
    if !found {
        return Err(WebError::NotFound(Some(me)));
    }

    Ok((session, Redirect::to(&format!("/users/{my_id}/following"))).into_response())
}

/// GET /users/profile
pub async fn edit_profile_form(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let (session, flashes) = session.take_flashes();
    let page = EditProfileTemplate {
        user: me.clone(),
        layout: Layout::new(Some(me), flashes),
        errors: vec![],
    };
    Ok((session, render(&page)?).into_response())
}

/// POST /users/profile: changes need the current password.
pub async fn edit_profile(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    form: Result<Form<ProfileForm>, FormRejection>,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };
    let form = form_or_default(form);

    if form.username.trim().is_empty() || !form.email.contains('@') {
        return render_profile_errors(session, me, form, "A username and a valid email are required.");
    }

    let user_id = me.id;
    let current_username = me.username.clone();
    let (outcome, form) = state
        .blocking(move |db| {
            if db.authenticate(&current_username, &form.password)?.is_none() {
                return Ok((ProfileOutcome::WrongPassword, form));
            }

            let update = ProfileUpdate {
                username: form.username.trim(),
                email: form.email.trim(),
                image_url: form.image_url.as_deref(),
                header_image_url: form.header_image_url.as_deref(),
                bio: form.bio.as_deref(),
                location: form.location.as_deref(),
            };
            let outcome = match db.update_profile(user_id, &update) {
                Ok(()) => ProfileOutcome::Updated,
                Err(DbError::Integrity(_)) => ProfileOutcome::Taken,
                Err(e) => return Err(e),
            };
            Ok((outcome, form))
        })
        .await?;

    match outcome {
        ProfileOutcome::WrongPassword => {
            let session = session.flash("danger", "Wrong password, please try again.");
            Ok((session, Redirect::to("/")).into_response())
        }
        ProfileOutcome::Taken => {
            render_profile_errors(session, me, form, "Username or email already taken.")
        }
        ProfileOutcome::Updated => {
            info!("User {} updated their profile", user_id);
            Ok((session, Redirect::to(&format!("/users/{user_id}"))).into_response())
        }
    }
}

/// Re-show the edit form with what the user typed.
fn render_profile_errors(
    session: Session,
    me: User,
    form: ProfileForm,
    error: &str,
) -> Result<Response, WebError> {
    let edited = User {
        username: form.username,
        email: form.email,
        image_url: form.image_url.unwrap_or_default(),
        header_image_url: form.header_image_url.unwrap_or_default(),
        bio: form.bio,
        location: form.location,
        ..me.clone()
    };

    let (session, flashes) = session.take_flashes();
    let page = EditProfileTemplate {
        layout: Layout::new(Some(me), flashes),
        user: edited,
        errors: vec![error.to_string()],
    };
    Ok((session, render(&page)?).into_response())
}

/// POST /users/delete: remove the logged-in user and everything they own.
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, WebError> {
    let Some(me) = user else {
        return Ok(access_unauthorized(session));
    };

    let user_id = me.id;
    state.blocking(move |db| db.delete_user(user_id)).await?;
    info!("User {} deleted their account", user_id);

    Ok((session.logout(), Redirect::to("/signup")).into_response())
}
