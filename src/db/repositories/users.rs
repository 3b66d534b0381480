use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::User,
};

fn row_to_user(row: &Row) -> Result<User> {
    let date_of_creation: String = row.get("date_of_creation")?;

    Ok(User {
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        password_hash: row.get("password_hash")?,
        password_salt: row.get("password_salt")?,
        date_of_creation: parse_datetime(&date_of_creation, "date_of_creation")?,
    })
}

impl Database {
    /// Create a user. Returns `None` when the name is already taken.
    pub async fn create_user(
        &self,
        user_name: String,
        password_hash: String,
        password_salt: String,
        date_of_creation: DateTime<Utc>,
    ) -> Result<Option<User>> {
        self.execute(move |conn| {
            // Check and insert within the same DB task so two registrations can't race.
            let taken: Option<i64> = conn
                .query_row(
                    "SELECT user_id FROM users WHERE user_name = ?1",
                    params![user_name],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO users (user_name, password_hash, password_salt, date_of_creation)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user_name,
                    password_hash,
                    password_salt,
                    format_datetime(&date_of_creation),
                ],
            )?;

            Ok(Some(User {
                user_id: conn.last_insert_rowid(),
                user_name,
                password_hash,
                password_salt,
                date_of_creation,
            }))
        })
        .await
    }

    pub async fn get_user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        let user_name = user_name.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, user_name, password_hash, password_salt, date_of_creation
                 FROM users
                 WHERE user_name = ?1",
            )?;

            let mut rows = stmt.query(params![user_name])?;
            let user = match rows.next()? {
                Some(row) => Some(row_to_user(row)?),
                None => None,
            };
            Ok(user)
        })
        .await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, user_name, password_hash, password_salt, date_of_creation
                 FROM users
                 WHERE user_id = ?1",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let user = match rows.next()? {
                Some(row) => Some(row_to_user(row)?),
                None => None,
            };
            Ok(user)
        })
        .await
    }

    /// Delete a user. Tokens, watches and logs go with it via ON DELETE CASCADE.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
            Ok(rows_affected > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::connection::test_support::open_temp_database;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn create_and_fetch_user() {
        let (_dir, db) = open_temp_database();
        let created_at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();

        let user = db
            .create_user("ada".into(), "hash".into(), "salt".into(), created_at)
            .await
            .unwrap()
            .expect("name is free");

        let by_name = db.get_user_by_name("ada").await.unwrap().unwrap();
        assert_eq!(by_name.user_id, user.user_id);
        assert_eq!(by_name.password_hash, "hash");
        assert_eq!(by_name.date_of_creation, created_at);

        let by_id = db.get_user(user.user_id).await.unwrap().unwrap();
        assert_eq!(by_id.user_name, "ada");
        assert!(db.get_user_by_name("grace").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_user_name_is_rejected() {
        let (_dir, db) = open_temp_database();
        let now = Utc::now();
        assert!(db
            .create_user("ada".into(), "a".into(), "b".into(), now)
            .await
            .unwrap()
            .is_some());
        assert!(db
            .create_user("ada".into(), "c".into(), "d".into(), now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_user_reports_whether_it_existed() {
        let (_dir, db) = open_temp_database();
        let user = db
            .create_user("ada".into(), "a".into(), "b".into(), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(db.delete_user(user.user_id).await.unwrap());
        assert!(!db.delete_user(user.user_id).await.unwrap());
        assert!(db.get_user(user.user_id).await.unwrap().is_none());
    }
}
