//! SQLite-backed implementation of the `ProgressRepository` port
//!
//! A commit updates `user_progress`, replaces the user's achievements and
//! upserts the affected task inside one IMMEDIATE transaction, guarded by
//! the row's `version` column.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questlog_core::{ProgressCommit, ProgressRepository};
use questlog_domain::{Achievement, QuestlogError, Result, UserProgress};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use tokio::task;
use tracing::debug;

use super::manager::DbManager;
use super::rows::{
    from_millis, from_sql_int, parse_date, parse_text, to_millis, to_sql_int, upsert_task,
};
use crate::errors::to_domain;

/// SQLite-backed progress repository.
pub struct SqliteProgressRepository {
    db: Arc<DbManager>,
}

impl SqliteProgressRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProgressRepository for SqliteProgressRepository {
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProgress> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();

        task::spawn_blocking(move || -> Result<UserProgress> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR IGNORE INTO user_progress (user_id, updated_at) VALUES (?1, ?2)",
                params![user_id, to_millis(now)],
            )
            .map_err(to_domain)?;
            load_progress(&conn, &user_id)
        })
        .await
        .map_err(to_domain)?
    }

    async fn commit(&self, commit: ProgressCommit) -> Result<UserProgress> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<UserProgress> {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(to_domain)?;

            let progress = &commit.progress;
            let updated = tx
                .execute(
                    "UPDATE user_progress
                     SET xp = ?1, level = ?2, streak = ?3, longest_streak = ?4,
                         last_activity_date = ?5, updated_at = ?6, version = version + 1
                     WHERE user_id = ?7 AND version = ?8",
                    params![
                        to_sql_int("xp", progress.xp)?,
                        progress.level,
                        progress.streak,
                        progress.longest_streak,
                        progress.last_activity_date.map(|date| date.to_string()),
                        to_millis(progress.updated_at),
                        progress.user_id,
                        to_sql_int("version", commit.expected_version)?,
                    ],
                )
                .map_err(to_domain)?;

            if updated == 0 {
                debug!(user_id = %progress.user_id, expected = commit.expected_version, "stale progress version");
                return Err(QuestlogError::ConcurrencyConflict(format!(
                    "progress of user {} changed since version {}",
                    progress.user_id, commit.expected_version
                )));
            }

            replace_achievements(&tx, &progress.user_id, &progress.achievements)?;
            upsert_task(&tx, &commit.task)?;

            let stored = load_progress(&tx, &progress.user_id)?;
            tx.commit().map_err(to_domain)?;
            Ok(stored)
        })
        .await
        .map_err(to_domain)?
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(to_domain)?;
            tx.execute("DELETE FROM achievements WHERE user_id = ?1", params![user_id])
                .map_err(to_domain)?;
            tx.execute("DELETE FROM user_progress WHERE user_id = ?1", params![user_id])
                .map_err(to_domain)?;
            tx.commit().map_err(to_domain)
        })
        .await
        .map_err(to_domain)?
    }
}

fn load_progress(conn: &Connection, user_id: &str) -> Result<UserProgress> {
    let mut progress = conn
        .query_row(
            "SELECT user_id, xp, level, streak, longest_streak, last_activity_date, version, updated_at
             FROM user_progress WHERE user_id = ?1",
            params![user_id],
            map_progress_row,
        )
        .map_err(to_domain)?;

    let mut stmt = conn
        .prepare(
            "SELECT id, kind, title, description, icon, unlocked_at
             FROM achievements WHERE user_id = ?1 ORDER BY position ASC",
        )
        .map_err(to_domain)?;
    progress.achievements = stmt
        .query_map(params![user_id], map_achievement_row)
        .map_err(to_domain)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(to_domain)?;

    Ok(progress)
}

fn replace_achievements(conn: &Connection, user_id: &str, achievements: &[Achievement]) -> Result<()> {
    conn.execute("DELETE FROM achievements WHERE user_id = ?1", params![user_id])
        .map_err(to_domain)?;

    let mut stmt = conn
        .prepare(
            "INSERT INTO achievements
                (user_id, id, kind, title, description, icon, unlocked_at, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(to_domain)?;
    for (position, achievement) in achievements.iter().enumerate() {
        stmt.execute(params![
            user_id,
            achievement.id,
            achievement.kind.to_string(),
            achievement.title,
            achievement.description,
            achievement.icon,
            to_millis(achievement.unlocked_at),
            to_sql_int("position", position as u64)?,
        ])
        .map_err(to_domain)?;
    }
    Ok(())
}

fn map_progress_row(row: &Row<'_>) -> rusqlite::Result<UserProgress> {
    Ok(UserProgress {
        user_id: row.get(0)?,
        xp: from_sql_int(1, row.get(1)?)?,
        level: from_sql_int(2, row.get(2)?)?,
        streak: from_sql_int(3, row.get(3)?)?,
        longest_streak: from_sql_int(4, row.get(4)?)?,
        last_activity_date: parse_date(5, row.get(5)?)?,
        achievements: Vec::new(),
        version: from_sql_int(6, row.get(6)?)?,
        updated_at: from_millis(7, row.get(7)?)?,
    })
}

fn map_achievement_row(row: &Row<'_>) -> rusqlite::Result<Achievement> {
    let kind: String = row.get(1)?;
    Ok(Achievement {
        id: row.get(0)?,
        kind: parse_text(1, &kind)?,
        title: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        unlocked_at: from_millis(5, row.get(5)?)?,
    })
}
