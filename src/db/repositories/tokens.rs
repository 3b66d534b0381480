use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::Token,
};

fn row_to_token(row: &Row) -> Result<Token> {
    let expiration: String = row.get("expiration")?;

    Ok(Token {
        token: row.get("token")?,
        user_id: row.get("user_id")?,
        expiration: parse_datetime(&expiration, "expiration")?,
    })
}

impl Database {
    pub async fn insert_token(&self, token: &Token) -> Result<()> {
        let record = token.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO tokens (token, user_id, expiration) VALUES (?1, ?2, ?3)",
                params![
                    record.token,
                    record.user_id,
                    format_datetime(&record.expiration),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_token(&self, token: &str) -> Result<Option<Token>> {
        let token = token.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT token, user_id, expiration FROM tokens WHERE token = ?1",
            )?;

            let mut rows = stmt.query(params![token])?;
            let token = match rows.next()? {
                Some(row) => Some(row_to_token(row)?),
                None => None,
            };
            Ok(token)
        })
        .await
    }

    pub async fn update_token_expiration(
        &self,
        token: &str,
        expiration: DateTime<Utc>,
    ) -> Result<()> {
        let token = token.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE tokens SET expiration = ?1 WHERE token = ?2",
                params![format_datetime(&expiration), token],
            )?;

            if rows_affected == 0 {
                return Err(anyhow::anyhow!("Token not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn delete_token(&self, token: &str) -> Result<()> {
        let token = token.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM tokens WHERE token = ?1", params![token])?;
            Ok(())
        })
        .await
    }

    /// Drop a user's tokens that expired at or before `now`.
    pub async fn delete_expired_tokens(&self, user_id: i64, now: DateTime<Utc>) -> Result<usize> {
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM tokens WHERE user_id = ?1 AND expiration <= ?2",
                params![user_id, format_datetime(&now)],
            )?;
            Ok(removed)
        })
        .await
    }
}
