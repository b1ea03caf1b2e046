//! Database row types. These map directly to SQLite rows.
//! Distinct from warbler-types view models to keep the password hash in this crate.
use chrono::{DateTime, Utc};
use tracing::warn;
use warbler_types::models::{Message, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// A message joined with its author's display fields.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub author_username: String,
    pub author_image_url: String,
}

/// Fields a user can change on their profile page. `None` image URLs reset to the defaults.
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let timestamp = parse_timestamp(&row.timestamp).unwrap_or_else(|| {
            warn!("Corrupt timestamp '{}' on message {}", row.timestamp, row.id);
            DateTime::default()
        });

        Message {
            id: row.id,
            text: row.text,
            timestamp,
            user_id: row.user_id,
            author_username: row.author_username,
            author_image_url: row.author_image_url,
        }
    }
}

/// Timestamps are stored as RFC 3339 only, so that sorting the column as
/// text sorts by time.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_rfc3339_timestamps() {
        assert!(parse_timestamp("2026-10-14T09:12:00.123456Z").is_some());
        assert!(parse_timestamp("2026-10-14 09:12:00").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn other_formats_fall_back_to_the_epoch() {
        let row = MessageRow {
            id: 1,
            text: "old".to_string(),
            timestamp: "2026-10-14 09:12:00".to_string(),
            user_id: 1,
            author_username: "testuser".to_string(),
            author_image_url: String::new(),
        };
        assert_eq!(Message::from(row).timestamp, DateTime::<Utc>::default());
    }
}
