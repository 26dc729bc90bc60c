//! SQLite-based storage implementation

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use studiodesk_core::{Role, TicketStatus, TicketType, UserId};

use super::{
    BugDetails, NewReply, NewTicket, NewUpdate, NewUser, Reply, ReplyId, StoreResult, Ticket,
    TicketId, TicketStore, Update, UpdateId, UpdatePatch, UpdateStore, User, UserStore,
};
use crate::error::DeskError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str = "id, email, password_hash, role, email_verified, \
     verification_token, verification_token_expires_at, reset_token, \
     reset_token_expires_at, created_at";

const TICKET_COLUMNS: &str = "id, title, description, email, user_id, view_token, \
     ticket_type, status, game_version, platform, severity, frequency, \
     steps_to_reproduce, expected_behavior, actual_behavior, created_at, updated_at";

const REPLY_COLUMNS: &str = "id, ticket_id, content, is_admin, created_at";

const UPDATE_COLUMNS: &str =
    "id, title, version, content, summary, is_published, created_at, updated_at";

/// SQLite-based store implementing every store trait over one connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, DeskError> {
        let conn = Connection::open(path).map_err(DeskError::internal)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(DeskError::internal)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DeskError::internal("database lock poisoned"))
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), DeskError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(DeskError::internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, DeskError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(DeskError::internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(DeskError::internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), DeskError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                email_verified INTEGER NOT NULL DEFAULT 0,
                verification_token TEXT,
                verification_token_expires_at TEXT,
                reset_token TEXT,
                reset_token_expires_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_verification_token ON users(verification_token);
            CREATE INDEX IF NOT EXISTS idx_users_reset_token ON users(reset_token);

            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                email TEXT,
                user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                view_token TEXT NOT NULL,
                ticket_type TEXT NOT NULL DEFAULT 'support',
                status TEXT NOT NULL DEFAULT 'open',
                game_version TEXT,
                platform TEXT,
                severity TEXT,
                frequency TEXT,
                steps_to_reproduce TEXT,
                expected_behavior TEXT,
                actual_behavior TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tickets_user_id ON tickets(user_id);

            CREATE TABLE IF NOT EXISTS replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_replies_ticket_id ON replies(ticket_id);

            CREATE TABLE IF NOT EXISTS updates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                version TEXT,
                content TEXT NOT NULL,
                summary TEXT,
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(DeskError::internal)?;

        Ok(())
    }
}

/// Fixed-width UTC timestamp so text columns sort chronologically
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => parse_timestamp(row, idx).map(Some),
        None => Ok(None),
    }
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = studiodesk_core::Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get::<_, i64>(0)? as u64),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: parse_text::<Role>(row, 3)?,
        email_verified: row.get(4)?,
        verification_token: row.get(5)?,
        verification_token_expires_at: parse_optional_timestamp(row, 6)?,
        reset_token: row.get(7)?,
        reset_token_expires_at: parse_optional_timestamp(row, 8)?,
        created_at: parse_timestamp(row, 9)?,
    })
}

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: TicketId(row.get::<_, i64>(0)? as u64),
        title: row.get(1)?,
        description: row.get(2)?,
        email: row.get(3)?,
        user_id: row.get::<_, Option<i64>>(4)?.map(|id| UserId(id as u64)),
        view_token: row.get(5)?,
        ticket_type: parse_text::<TicketType>(row, 6)?,
        status: parse_text::<TicketStatus>(row, 7)?,
        bug: BugDetails {
            game_version: row.get(8)?,
            platform: row.get(9)?,
            severity: row.get(10)?,
            frequency: row.get(11)?,
            steps_to_reproduce: row.get(12)?,
            expected_behavior: row.get(13)?,
            actual_behavior: row.get(14)?,
        },
        created_at: parse_timestamp(row, 15)?,
        updated_at: parse_timestamp(row, 16)?,
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: ReplyId(row.get::<_, i64>(0)? as u64),
        ticket_id: TicketId(row.get::<_, i64>(1)? as u64),
        content: row.get(2)?,
        is_admin: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
    })
}

fn update_from_row(row: &Row<'_>) -> rusqlite::Result<Update> {
    Ok(Update {
        id: UpdateId(row.get::<_, i64>(0)? as u64),
        title: row.get(1)?,
        version: row.get(2)?,
        content: row.get(3)?,
        summary: row.get(4)?,
        is_published: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn get_user_where(
    conn: &Connection,
    clause: &str,
    value: &dyn rusqlite::ToSql,
) -> StoreResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}"),
        params![value],
        user_from_row,
    )
    .optional()
    .map_err(DeskError::internal)
}

fn get_ticket(conn: &Connection, ticket_id: TicketId) -> StoreResult<Option<Ticket>> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
        params![ticket_id.0 as i64],
        ticket_from_row,
    )
    .optional()
    .map_err(DeskError::internal)
}

fn get_update(conn: &Connection, update_id: UpdateId) -> StoreResult<Option<Update>> {
    conn.query_row(
        &format!("SELECT {UPDATE_COLUMNS} FROM updates WHERE id = ?1"),
        params![update_id.0 as i64],
        update_from_row,
    )
    .optional()
    .map_err(DeskError::internal)
}

impl UserStore for SqliteStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let conn = self.conn()?;
        let email = new.email.to_lowercase();

        conn.execute(
            "INSERT INTO users (email, password_hash, role, email_verified, \
             verification_token, verification_token_expires_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                email,
                new.password_hash,
                new.role.as_str(),
                new.email_verified,
                new.verification_token,
                new.verification_token_expires_at.map(timestamp),
                timestamp(new.created_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                DeskError::DuplicateAccount
            } else {
                DeskError::internal(e)
            }
        })?;

        let id = conn.last_insert_rowid();
        get_user_where(&conn, "id = ?1", &id)?
            .ok_or_else(|| DeskError::internal("inserted user vanished"))
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        get_user_where(&conn, "id = ?1", &(user_id.0 as i64))
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        get_user_where(&conn, "email = ?1", &email.to_lowercase())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
            ))
            .map_err(DeskError::internal)?;

        let users = stmt
            .query_map([], user_from_row)
            .map_err(DeskError::internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DeskError::internal)?;
        Ok(users)
    }

    fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "UPDATE users SET email_verified = 1, verification_token = NULL, \
                 verification_token_expires_at = NULL \
                 WHERE verification_token = ?1 AND verification_token_expires_at > ?2 \
                 RETURNING {USER_COLUMNS}"
            ),
            params![token, timestamp(now)],
            user_from_row,
        )
        .optional()
        .map_err(DeskError::internal)
    }

    fn set_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn
            .execute(
                "UPDATE users SET reset_token = ?1, reset_token_expires_at = ?2 WHERE id = ?3",
                params![token, timestamp(expires_at), user_id.0 as i64],
            )
            .map_err(DeskError::internal)?;

        if rows == 0 {
            return Err(DeskError::NotFound("User"));
        }
        Ok(())
    }

    fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "UPDATE users SET password_hash = ?1, reset_token = NULL, \
                 reset_token_expires_at = NULL \
                 WHERE reset_token = ?2 AND reset_token_expires_at > ?3 \
                 RETURNING {USER_COLUMNS}"
            ),
            params![password_hash, token, timestamp(now)],
            user_from_row,
        )
        .optional()
        .map_err(DeskError::internal)
    }

    fn mark_verified(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn
            .execute(
                "UPDATE users SET email_verified = 1, verification_token = NULL, \
                 verification_token_expires_at = NULL WHERE id = ?1",
                params![user_id.0 as i64],
            )
            .map_err(DeskError::internal)?;

        if rows == 0 {
            return Err(DeskError::NotFound("User"));
        }
        Ok(())
    }

    fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn
            .execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                params![role.as_str(), user_id.0 as i64],
            )
            .map_err(DeskError::internal)?;

        if rows == 0 {
            return Err(DeskError::NotFound("User"));
        }
        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn
            .execute("DELETE FROM users WHERE id = ?1", params![user_id.0 as i64])
            .map_err(DeskError::internal)?;

        if rows == 0 {
            return Err(DeskError::NotFound("User"));
        }
        Ok(())
    }
}

impl TicketStore for SqliteStore {
    fn create_ticket(&self, new: NewTicket) -> StoreResult<Ticket> {
        let conn = self.conn()?;
        let created_at = timestamp(new.created_at);
        let bug = &new.bug;

        conn.execute(
            "INSERT INTO tickets (title, description, email, user_id, view_token, ticket_type, \
             status, game_version, platform, severity, frequency, steps_to_reproduce, \
             expected_behavior, actual_behavior, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
            params![
                new.title,
                new.description,
                new.email,
                new.user_id.map(|id| id.0 as i64),
                new.view_token,
                new.ticket_type.as_str(),
                TicketStatus::Open.as_str(),
                bug.game_version,
                bug.platform,
                bug.severity,
                bug.frequency,
                bug.steps_to_reproduce,
                bug.expected_behavior,
                bug.actual_behavior,
                created_at,
            ],
        )
        .map_err(DeskError::internal)?;

        let id = TicketId(conn.last_insert_rowid() as u64);
        get_ticket(&conn, id)?.ok_or_else(|| DeskError::internal("inserted ticket vanished"))
    }

    fn get_ticket(&self, ticket_id: TicketId) -> StoreResult<Option<Ticket>> {
        let conn = self.conn()?;
        get_ticket(&conn, ticket_id)
    }

    fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at DESC, id DESC"
            ))
            .map_err(DeskError::internal)?;

        let tickets = stmt
            .query_map([], ticket_from_row)
            .map_err(DeskError::internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DeskError::internal)?;
        Ok(tickets)
    }

    fn update_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Ticket>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "UPDATE tickets SET status = ?1, updated_at = ?2 WHERE id = ?3 \
                 RETURNING {TICKET_COLUMNS}"
            ),
            params![status.as_str(), timestamp(now), ticket_id.0 as i64],
            ticket_from_row,
        )
        .optional()
        .map_err(DeskError::internal)
    }

    fn create_reply(&self, new: NewReply) -> StoreResult<Reply> {
        let conn = self.conn()?;
        if get_ticket(&conn, new.ticket_id)?.is_none() {
            return Err(DeskError::NotFound("Ticket"));
        }

        conn.query_row(
            &format!(
                "INSERT INTO replies (ticket_id, content, is_admin, created_at) \
                 VALUES (?1, ?2, ?3, ?4) RETURNING {REPLY_COLUMNS}"
            ),
            params![
                new.ticket_id.0 as i64,
                new.content,
                new.is_admin,
                timestamp(new.created_at),
            ],
            reply_from_row,
        )
        .map_err(DeskError::internal)
    }

    fn list_replies(&self, ticket_id: TicketId) -> StoreResult<Vec<Reply>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {REPLY_COLUMNS} FROM replies WHERE ticket_id = ?1 \
                 ORDER BY created_at ASC, id ASC"
            ))
            .map_err(DeskError::internal)?;

        let replies = stmt
            .query_map(params![ticket_id.0 as i64], reply_from_row)
            .map_err(DeskError::internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DeskError::internal)?;
        Ok(replies)
    }
}

impl UpdateStore for SqliteStore {
    fn create_update(&self, new: NewUpdate) -> StoreResult<Update> {
        let conn = self.conn()?;
        let created_at = timestamp(new.created_at);

        conn.query_row(
            &format!(
                "INSERT INTO updates (title, version, content, summary, is_published, \
                 created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
                 RETURNING {UPDATE_COLUMNS}"
            ),
            params![
                new.title,
                new.version,
                new.content,
                new.summary,
                new.is_published,
                created_at,
            ],
            update_from_row,
        )
        .map_err(DeskError::internal)
    }

    fn get_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>> {
        let conn = self.conn()?;
        get_update(&conn, update_id)
    }

    fn list_published(&self, limit: Option<usize>) -> StoreResult<Vec<Update>> {
        let conn = self.conn()?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {UPDATE_COLUMNS} FROM updates WHERE is_published = 1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))
            .map_err(DeskError::internal)?;

        let updates = stmt
            .query_map(params![limit], update_from_row)
            .map_err(DeskError::internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DeskError::internal)?;
        Ok(updates)
    }

    fn edit_update(
        &self,
        update_id: UpdateId,
        patch: &UpdatePatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Update>> {
        let conn = self.conn()?;
        let Some(mut update) = get_update(&conn, update_id)? else {
            return Ok(None);
        };
        update.apply(patch, now);

        conn.execute(
            "UPDATE updates SET title = ?1, version = ?2, content = ?3, summary = ?4, \
             is_published = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                update.title,
                update.version,
                update.content,
                update.summary,
                update.is_published,
                timestamp(update.updated_at),
                update_id.0 as i64,
            ],
        )
        .map_err(DeskError::internal)?;

        Ok(Some(update))
    }

    fn delete_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("DELETE FROM updates WHERE id = ?1 RETURNING {UPDATE_COLUMNS}"),
            params![update_id.0 as i64],
            update_from_row,
        )
        .optional()
        .map_err(DeskError::internal)
    }
}
