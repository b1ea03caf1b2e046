use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use rusqlite::params;
use warbler_types::forms::non_blank;
use warbler_types::models::DEFAULT_IMAGE_URL;

use crate::models::UserRow;
use crate::queries::query_user_by_id;
use crate::{Database, DbError, Result};

impl Database {
    /// Create a user with an Argon2id-hashed password.
    ///
    /// An empty password is rejected before the database is touched. Duplicate
    /// or empty usernames and emails come back as [`DbError::Integrity`].
    pub fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<UserRow> {
        if password.is_empty() {
            return Err(DbError::EmptyPassword);
        }

        let password_hash = hash_password(password)?;
        let image_url = non_blank(image_url).unwrap_or(DEFAULT_IMAGE_URL);

        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, image_url],
            )?;
            query_user_by_id(tx, tx.last_insert_rowid())?
                .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    /// Look up `username` and check `password` against its stored hash.
    /// Unknown users and wrong passwords both yield `None`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };

        let verified = {
            let parsed_hash = PasswordHash::new(&user.password)?;
            match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
                Ok(()) => true,
                Err(password_hash::Error::Password) => false,
                Err(e) => return Err(e.into()),
            }
        };

        Ok(verified.then_some(user))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
