//! A cookie-keeping test client over the Warbler router.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::cookie::Key;
use tower::ServiceExt;

use warbler_db::Database;
use warbler_db::models::UserRow;
use warbler_web::session::Session;
use warbler_web::{AppState, router};

pub const ONE_PIC: &str = "https://images.freeimages.com/images/small-previews/81e/number-one-1504449.jpg";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }
}

pub struct TestClient {
    pub state: AppState,
    router: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    /// Fresh app over an empty in-memory database.
    pub fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state = AppState::new(db, Key::generate());
        Self {
            router: router(state.clone()),
            state,
            cookies: HashMap::new(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn signup(&self, username: &str, email: &str, password: &str) -> UserRow {
        self.db().signup(username, email, password, None).unwrap()
    }

    /// Store a session cookie for `user_id`, whether or not that user exists.
    pub fn login_as(&mut self, user_id: i64) {
        let response = (Session::new(self.state.cookie_key.clone()).login(user_id), ()).into_response();
        self.store_cookies(response.headers());
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, None).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(form)).await
    }

    /// Keep issuing GETs for each redirect, like a browser would.
    pub async fn follow_redirects(&mut self, mut response: TestResponse) -> TestResponse {
        while response.status.is_redirection() {
            let location = response.location().unwrap().to_string();
            response = self.get(&location).await;
        }
        response
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie_header);
        }

        let request = match form {
            Some(form) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        self.store_cookies(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookies(&mut self, headers: &HeaderMap) {
        for set_cookie in headers.get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name.trim());
            } else {
                self.cookies.insert(name.trim().to_string(), value.to_string());
            }
        }
    }
}
