mod common;

use axum::http::StatusCode;
use common::TestClient;

fn setup() -> (TestClient, i64) {
    let client = TestClient::new();
    let user = client.signup("testuser", "test@test.com", "testuser");
    (client, user.id)
}

#[tokio::test]
async fn add_message_redirects_and_persists() {
    let (mut client, user_id) = setup();
    client.login_as(user_id);

    let response = client.post_form("/messages/new", "text=Hello").await;
    assert!(response.status.is_redirection(), "got {}", response.status);
    assert_eq!(response.location(), Some(format!("/users/{user_id}").as_str()));

    assert_eq!(client.db().count_messages().unwrap(), 1);
    let messages = client.db().messages_for_user(user_id, 10).unwrap();
    assert_eq!(messages[0].text, "Hello");
    assert_eq!(messages[0].user_id, user_id);

    let profile = client.follow_redirects(response).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.body.contains("Hello"));
}

#[tokio::test]
async fn blank_or_long_messages_rerender_the_form() {
    let (mut client, user_id) = setup();
    client.login_as(user_id);

    let response = client.post_form("/messages/new", "text=+++").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Message text is required."));

    let long = "a".repeat(141);
    let response = client.post_form("/messages/new", &format!("text={long}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("limited to 140 characters"));

    assert_eq!(client.db().count_messages().unwrap(), 0);
}

#[tokio::test]
async fn delete_own_message() {
    let (mut client, user_id) = setup();
    let message = client.db().insert_message(user_id, "Test message 1.").unwrap();
    client.login_as(user_id);

    let response = client.post(&format!("/messages/{}/delete", message.id)).await;
    let response = client.follow_redirects(response).await;
    assert_eq!(response.status, StatusCode::OK);

    assert!(client.db().get_message(message.id).unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_missing_message_is_not_found() {
    let (mut client, user_id) = setup();
    client.login_as(user_id);

    let response = client.post("/messages/11111/delete").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logged_out_add_is_unauthorized() {
    let (mut client, _) = setup();

    let response = client.post("/messages/new").await;
    assert!(response.status.is_redirection());
    assert_eq!(response.location(), Some("/"));

    let response = client.follow_redirects(response).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Access unauthorized"));
    assert_eq!(client.db().count_messages().unwrap(), 0);
}

#[tokio::test]
async fn logged_out_delete_is_unauthorized() {
    let (mut client, user_id) = setup();
    let message = client.db().insert_message(user_id, "Test message 1.").unwrap();

    let response = client.post(&format!("/messages/{}/delete", message.id)).await;
    let response = client.follow_redirects(response).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Access unauthorized"));
    assert!(client.db().get_message(message.id).unwrap().is_some());
}

#[tokio::test]
async fn session_for_a_missing_user_cannot_add() {
    let (mut client, user_id) = setup();
    client.db().insert_message(user_id, "Test message 1.").unwrap();
    client.login_as(77777);

    let response = client.post_form("/messages/new", "text=Sneaky").await;
    let response = client.follow_redirects(response).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Access unauthorized"));
    assert_eq!(client.db().count_messages().unwrap(), 1);
}

#[tokio::test]
async fn cannot_delete_another_users_message() {
    let (mut client, user_id) = setup();
    let message = client.db().insert_message(user_id, "Test message 1.").unwrap();
    let other = client.signup("Unauthorizated", "email@email.com", "password");
    client.login_as(other.id);

    let response = client.post(&format!("/messages/{}/delete", message.id)).await;
    let response = client.follow_redirects(response).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Access unauthorized"));
    assert!(client.db().get_message(message.id).unwrap().is_some());
}

#[tokio::test]
async fn message_page_is_public() {
    let (mut client, user_id) = setup();
    let message = client.db().insert_message(user_id, "Anyone can read this").unwrap();

    let response = client.get(&format!("/messages/{}", message.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Anyone can read this"));
    assert!(!response.body.contains("/delete"));

    let response = client.get("/messages/424242").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn liking_toggles_and_own_messages_cannot_be_liked() {
    let (mut client, user_id) = setup();
    let message = client.db().insert_message(user_id, "Like me").unwrap();
    let fan = client.signup("fan", "fan@email.com", "password");

    client.login_as(fan.id);
    client.post(&format!("/messages/{}/like", message.id)).await;
    assert_eq!(client.db().liked_message_ids(fan.id).unwrap(), vec![message.id]);

    client.post(&format!("/messages/{}/like", message.id)).await;
    assert!(client.db().liked_message_ids(fan.id).unwrap().is_empty());

    client.login_as(user_id);
    let response = client.post(&format!("/messages/{}/like", message.id)).await;
    let response = client.follow_redirects(response).await;
    assert!(response.body.contains("You cannot like your own message."));
    assert!(client.db().liked_message_ids(user_id).unwrap().is_empty());
}

#[tokio::test]
async fn logged_out_like_is_unauthorized() {
    let (mut client, user_id) = setup();
    let message = client.db().insert_message(user_id, "Like me").unwrap();

    let response = client.post(&format!("/messages/{}/like", message.id)).await;
    let response = client.follow_redirects(response).await;
    assert!(response.body.contains("Access unauthorized"));
    assert_eq!(client.db().user_stats(user_id).unwrap().likes, 0);
}

#[tokio::test]
async fn missing_message_page_keeps_the_viewer_logged_in() {
    let (mut client, user_id) = setup();
    client.login_as(user_id);

    let response = client.get("/messages/424242").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Log out"));
    assert!(!response.body.contains("Access unauthorized"));
}
