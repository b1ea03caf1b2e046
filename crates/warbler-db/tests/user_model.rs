use warbler_db::{Database, DbError};

const ONE_PIC: &str = "https://images.freeimages.com/images/small-previews/81e/number-one-1504449.jpg";

fn setup() -> Database {
    Database::open_in_memory().unwrap()
}

#[test]
fn new_user_has_no_messages_or_followers() {
    let db = setup();
    let user = db.signup("testuser", "test@test.com", "HASHED_PASSWORD", None).unwrap();

    assert!(db.messages_for_user(user.id, 100).unwrap().is_empty());
    assert!(db.followers(user.id).unwrap().is_empty());
    assert!(db.following(user.id).unwrap().is_empty());
}

#[test]
fn signup_hashes_password_and_fills_defaults() {
    let db = setup();
    let user = db.signup("TestUser1", "email1@email.com", "password1", Some(ONE_PIC)).unwrap();

    assert_ne!(user.password, "password1");
    assert!(user.password.starts_with("$argon2"));
    assert_eq!(user.image_url, ONE_PIC);
    assert_eq!(user.header_image_url, "/static/images/warbler-hero.jpg");

    let plain = db.signup("TestUser2", "email2@email.com", "password2", Some("")).unwrap();
    assert_eq!(plain.image_url, "/static/images/default-pic.png");
}

#[test]
fn is_following_detects_direction() {
    let db = setup();
    let user1 = db.signup("TestUser1", "email1@email.com", "password1", Some(ONE_PIC)).unwrap();
    let user2 = db.signup("TestUser2", "email2@email.com", "password2", None).unwrap();

    db.follow(user1.id, user2.id).unwrap();

    assert!(db.is_following(user1.id, user2.id).unwrap());
    assert!(!db.is_following(user2.id, user1.id).unwrap());
}

#[test]
fn is_followed_by_is_the_dual_of_is_following() {
    let db = setup();
    let user1 = db.signup("TestUser1", "email1@email.com", "password1", None).unwrap();
    let user2 = db.signup("TestUser2", "email2@email.com", "password2", None).unwrap();

    db.follow(user1.id, user2.id).unwrap();

    assert!(db.is_followed_by(user2.id, user1.id).unwrap());
    assert!(!db.is_followed_by(user1.id, user2.id).unwrap());

    let followers: Vec<_> = db.followers(user2.id).unwrap().into_iter().map(|u| u.username).collect();
    assert_eq!(followers, vec!["TestUser1"]);
}

#[test]
fn following_twice_keeps_one_edge_and_unfollow_removes_it() {
    let db = setup();
    let user1 = db.signup("TestUser1", "email1@email.com", "password1", None).unwrap();
    let user2 = db.signup("TestUser2", "email2@email.com", "password2", None).unwrap();

    db.follow(user1.id, user2.id).unwrap();
    db.follow(user1.id, user2.id).unwrap();
    assert_eq!(db.user_stats(user2.id).unwrap().followers, 1);

    assert!(db.unfollow(user1.id, user2.id).unwrap());
    assert!(!db.unfollow(user1.id, user2.id).unwrap());
    assert!(!db.is_following(user1.id, user2.id).unwrap());
}

#[test]
fn duplicate_username_is_an_integrity_error() {
    let db = setup();
    db.signup("testuser", "test@test.com", "password", None).unwrap();

    let err = db.signup("testuser", "other@test.com", "password", None).unwrap_err();
    assert!(err.is_integrity(), "got {err:?}");
}

#[test]
fn duplicate_email_is_an_integrity_error() {
    let db = setup();
    db.signup("testuser", "test@test.com", "password", None).unwrap();

    let err = db.signup("otheruser", "test@test.com", "password", None).unwrap_err();
    assert!(err.is_integrity(), "got {err:?}");
}

#[test]
fn empty_username_or_email_is_an_integrity_error() {
    let db = setup();

    assert!(db.signup("", "test@test.com", "password", None).unwrap_err().is_integrity());
    assert!(db.signup("testuser", "", "password", None).unwrap_err().is_integrity());
}

#[test]
fn empty_password_is_rejected_before_insert() {
    let db = setup();

    let err = db.signup("testuser", "test@test.com", "", None).unwrap_err();
    assert!(matches!(err, DbError::EmptyPassword), "got {err:?}");
    assert!(db.get_user_by_username("testuser").unwrap().is_none());
}

#[test]
fn authenticate_accepts_only_correct_credentials() {
    let db = setup();
    let user = db.signup("testuser", "test@test.com", "testuser", None).unwrap();

    let found = db.authenticate("testuser", "testuser").unwrap().unwrap();
    assert_eq!(found.id, user.id);

    assert!(db.authenticate("nobody", "testuser").unwrap().is_none());
    assert!(db.authenticate("testuser", "wrong").unwrap().is_none());
}

#[test]
fn search_matches_username_substrings() {
    let db = setup();
    db.signup("TestUser1", "email1@email.com", "password1", None).unwrap();
    db.signup("TestUser2", "email2@email.com", "password2", None).unwrap();
    db.signup("birdwatcher", "bird@email.com", "password3", None).unwrap();

    let names: Vec<_> = db.search_users(Some("User")).unwrap().into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["TestUser1", "TestUser2"]);
    assert_eq!(db.search_users(Some("  ")).unwrap().len(), 3);
    assert_eq!(db.search_users(None).unwrap().len(), 3);
}

#[test]
fn search_treats_wildcards_literally_and_ignores_case() {
    let db = setup();
    db.signup("alice", "alice@email.com", "password1", None).unwrap();
    db.signup("bob", "bob@email.com", "password2", None).unwrap();
    db.signup("snake_case", "snake@email.com", "password3", None).unwrap();

    assert!(db.search_users(Some("%")).unwrap().is_empty());

    let names: Vec<_> = db.search_users(Some("_")).unwrap().into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["snake_case"]);

    let names: Vec<_> = db.search_users(Some("ALI")).unwrap().into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["alice"]);
}

#[test]
fn deleting_a_user_cascades() {
    let db = setup();
    let user1 = db.signup("TestUser1", "email1@email.com", "password1", None).unwrap();
    let user2 = db.signup("TestUser2", "email2@email.com", "password2", None).unwrap();
    let msg = db.insert_message(user1.id, "Goodbye.").unwrap();
    db.follow(user2.id, user1.id).unwrap();
    db.add_like(user2.id, msg.id).unwrap();

    assert!(db.delete_user(user1.id).unwrap());

    assert!(db.get_message(msg.id).unwrap().is_none());
    assert!(db.following(user2.id).unwrap().is_empty());
    assert!(db.liked_messages(user2.id).unwrap().is_empty());
    assert!(db.get_user(user1.id).unwrap().is_none());
}

#[test]
fn reset_drops_all_rows() {
    let db = setup();
    db.signup("testuser", "test@test.com", "password", None).unwrap();

    db.reset().unwrap();

    assert!(db.search_users(None).unwrap().is_empty());
    db.signup("testuser", "test@test.com", "password", None).unwrap();
}
