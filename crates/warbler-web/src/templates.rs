//! Askama page templates. Files live under `templates/` in this crate.

use askama::Template;
use axum::response::Html;
use warbler_types::models::{Message, User, UserStats};

use crate::error::WebError;
use crate::session::Flash;

/// What every page shows around its content: the nav bar and pending flashes.
#[derive(Debug, Default)]
pub struct Layout {
    pub current_user: Option<User>,
    pub flashes: Vec<Flash>,
}

impl Layout {
    pub fn new(current_user: Option<User>, flashes: Vec<Flash>) -> Self {
        Self {
            current_user,
            flashes,
        }
    }
}

pub struct MessageCard {
    pub message: Message,
    pub liked: bool,
    /// Logged in and not the author.
    pub can_like: bool,
}

pub struct UserCard {
    pub user: User,
    pub followed: bool,
    /// Logged in and not this user.
    pub can_follow: bool,
}

pub struct ProfileHeader {
    pub user: User,
    pub stats: UserStats,
    pub followed: bool,
    pub is_me: bool,
    pub logged_in: bool,
}

#[derive(Template)]
#[template(path = "home-anon.html")]
pub struct AnonHomeTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub profile: ProfileHeader,
    pub messages: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub username: String,
}

#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UserIndexTemplate {
    pub layout: Layout,
    pub q: String,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub layout: Layout,
    pub profile: ProfileHeader,
    pub messages: Vec<MessageCard>,
}

/// Followers and following share one page.
#[derive(Template)]
#[template(path = "users/follows.html")]
pub struct FollowListTemplate {
    pub layout: Layout,
    pub profile: ProfileHeader,
    pub heading: &'static str,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "users/likes.html")]
pub struct LikesTemplate {
    pub layout: Layout,
    pub profile: ProfileHeader,
    pub messages: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "users/edit.html")]
pub struct EditProfileTemplate {
    pub layout: Layout,
    pub user: User,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "messages/new.html")]
pub struct NewMessageTemplate {
    pub layout: Layout,
    pub text: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "messages/show.html")]
pub struct MessageShowTemplate {
    pub layout: Layout,
    pub card: MessageCard,
    pub is_mine: bool,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

pub fn render<T: Template>(page: &T) -> Result<Html<String>, WebError> {
    Ok(Html(page.render()?))
}
