//! [`SqliteStore`], the SQLite implementation of [`HostelStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use gatepass_core::{
  principal::Principal,
  store::{Account, HostelStore, NewSubmission, NewUser},
  submission::{PassUpdate, Submission},
};

use crate::{
  Error, Result,
  encode::{
    RawSubmissionRow, RawUser, SUBMISSION_SELECT, USER_COLUMNS, decode_dt,
    encode_dt, encode_gender, encode_role,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gatepass store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Remove sessions that expired before `now`. Returns how many were
  /// removed.
  pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT token_hash, expires_at FROM sessions")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut expired = Vec::new();
    for (hash, at) in rows {
      if decode_dt(&at)? <= now {
        expired.push(hash);
      }
    }
    let count = expired.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for hash in &expired {
          tx.execute("DELETE FROM sessions WHERE token_hash = ?1", [hash])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    if count > 0 {
      tracing::debug!(count, "purged expired sessions");
    }
    Ok(count)
  }
}

// ─── HostelStore impl ────────────────────────────────────────────────────────

impl HostelStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, user: NewUser) -> Result<Principal> {
    let email      = user.email.trim().to_owned();
    let name       = user.name.clone();
    let role_str   = encode_role(user.role);
    let gender_str = encode_gender(user.gender);
    let hash       = user.password_hash;
    let at_str     = encode_dt(Utc::now());

    let insert_email = email.clone();
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![insert_email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO users (email, name, role, gender, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![insert_email, name, role_str, gender_str, hash, at_str],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let id = id.ok_or_else(|| Error::DuplicateEmail(email.clone()))?;
    Ok(Principal { id, email, name: user.name, role: user.role, gender: user.gender })
  }

  async fn get_user(&self, id: i64) -> Result<Option<Principal>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id],
            |row| RawUser::from_row(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_principal).transpose()
  }

  async fn find_account(&self, email: &str) -> Result<Option<Account>> {
    let email = email.trim().to_owned();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            rusqlite::params![email],
            |row| Ok((RawUser::from_row(row, 0)?, row.get(5)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(user, password_hash)| {
        Ok(Account { principal: user.into_principal()?, password_hash })
      })
      .transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(
    &self,
    token_hash: String,
    user_id:    i64,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    if self.get_user(user_id).await?.is_none() {
      return Err(Error::UserNotFound(user_id));
    }

    let created_str = encode_dt(Utc::now());
    let expires_str = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![token_hash, user_id, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_principal(
    &self,
    token_hash: &str,
    now:        DateTime<Utc>,
  ) -> Result<Option<Principal>> {
    let token_hash = token_hash.to_owned();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.user_id, u.email, u.name, u.role, u.gender, s.expires_at
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token_hash = ?1",
            rusqlite::params![token_hash],
            |row| Ok((RawUser::from_row(row, 0)?, row.get(5)?)),
          )
          .optional()?)
      })
      .await?;

    let Some((user, expires_at)) = raw else {
      return Ok(None);
    };
    if decode_dt(&expires_at)? <= now {
      return Ok(None);
    }
    user.into_principal().map(Some)
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool> {
    let token_hash = token_hash.to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn create_submission(&self, input: NewSubmission) -> Result<Submission> {
    if self.get_user(input.student_id).await?.is_none() {
      return Err(Error::UserNotFound(input.student_id));
    }

    let at_str = encode_dt(Utc::now());
    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO submissions (student_id, submit, photo, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![input.student_id, input.submit, input.photo, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self
      .get_submission(id)
      .await?
      .ok_or(Error::SubmissionNotFound(id))
  }

  async fn get_submission(&self, id: i64) -> Result<Option<Submission>> {
    let raw: Option<RawSubmissionRow> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{SUBMISSION_SELECT} WHERE s.submission_id = ?1"),
            rusqlite::params![id],
            RawSubmissionRow::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubmissionRow::into_submission).transpose()
  }

  async fn list_submissions(&self, student_id: Option<i64>) -> Result<Vec<Submission>> {
    let raws: Vec<RawSubmissionRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{SUBMISSION_SELECT}
           WHERE (?1 IS NULL OR s.student_id = ?1)
           ORDER BY s.submission_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![student_id], RawSubmissionRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmissionRow::into_submission).collect()
  }

  async fn update_pass(&self, id: i64, update: PassUpdate) -> Result<Submission> {
    let current = self
      .get_submission(id)
      .await?
      .ok_or(Error::SubmissionNotFound(id))?;

    let mut next = current.clone();
    next.apply(update)?;

    // Guard on the state we read so a concurrent writer is not overwritten.
    let prev_submit   = current.state.is_submitted();
    let prev_returned = current.state.is_returned();
    let prev_out      = current.out_time().map(encode_dt);
    let submit        = next.state.is_submitted();
    let returned      = next.state.is_returned();
    let out_str       = next.out_time().map(encode_dt);
    let in_str        = next.in_time().map(encode_dt);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE submissions
           SET submit = ?1, returned = ?2, comeout_time = ?3, comein_time = ?4
           WHERE submission_id = ?5
             AND submit = ?6 AND returned = ?7 AND comeout_time IS ?8",
          rusqlite::params![
            submit,
            returned,
            out_str,
            in_str,
            id,
            prev_submit,
            prev_returned,
            prev_out,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      tracing::warn!(submission = id, "pass update lost a race");
      return Err(Error::Conflict(id));
    }
    Ok(next)
  }
}
