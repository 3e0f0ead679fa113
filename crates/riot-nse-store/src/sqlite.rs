//! SQLite implementation of the SessionStore trait.
//!
//! This is the durable store the main application syncs into and the
//! notification extension reads from. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.
//!
//! The main application opens the file with [`FileStore::open`], which
//! migrates the schema, switches the file to WAL mode and claims it for the
//! account. The extension opens it with [`FileStore::open_read_only`], which
//! changes nothing on disk.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use riot_nse_core::{
    AccountData, Credentials, EventStreamToken, RoomAccountData, RoomId, RoomSummary, StateEvent,
    User, UserId,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::SessionStore;

/// How long a statement waits on a lock held by the other process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based durable session store for one account.
///
/// The event-stream cursor and user account data are cached in memory by
/// [`load_metadata`](FileStore::load_metadata) and written back by
/// [`commit`](SessionStore::commit). Everything else goes straight to SQLite.
pub struct FileStore {
    /// The account this store was opened for.
    credentials: Credentials,
    /// The SQLite connection; `None` once closed.
    conn: Arc<Mutex<Option<Connection>>>,
    /// Cached metadata row.
    metadata: RwLock<Metadata>,
    access: Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Default)]
struct Metadata {
    loaded: bool,
    closed: bool,
    event_stream_token: Option<EventStreamToken>,
    user_account_data: Option<AccountData>,
    dirty: bool,
    /// Bumped on every setter call so a commit only clears `dirty` for the
    /// values it actually wrote.
    generation: u64,
}

impl FileStore {
    /// Open the SQLite database at the given path for `credentials`.
    ///
    /// Creates the parent directory and the file, runs migrations and
    /// switches the file to WAL mode. The persisted metadata is not read until
    /// [`load_metadata`](Self::load_metadata).
    pub fn open(path: impl AsRef<Path>, credentials: Credentials) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        migration::migrate(&mut conn)?;

        tracing::info!(
            path = %path.display(),
            user_id = %credentials.user_id,
            "opened session store"
        );
        Ok(Self::from_connection(conn, credentials, Access::ReadWrite))
    }

    /// Open an existing database without changing it.
    ///
    /// The file is never created, migrated or claimed, and the connection
    /// refuses writes. [`load_metadata`](Self::load_metadata) fails with
    /// [`StoreError::ForeignOwner`] instead of wiping a database owned by
    /// another account.
    pub fn open_read_only(path: impl AsRef<Path>, credentials: Credentials) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }

        // Read-write handle so WAL readers can use the shared-memory file;
        // query_only blocks every write statement.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "query_only", true)?;
        migration::check_version(&conn)?;

        tracing::info!(
            path = %path.display(),
            user_id = %credentials.user_id,
            "opened session store read-only"
        );
        Ok(Self::from_connection(conn, credentials, Access::ReadOnly))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory(credentials: Credentials) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn, credentials, Access::ReadWrite))
    }

    fn from_connection(conn: Connection, credentials: Credentials, access: Access) -> Self {
        Self {
            credentials,
            conn: Arc::new(Mutex::new(Some(conn))),
            metadata: RwLock::new(Metadata::default()),
            access,
        }
    }

    /// The credentials this store was opened for.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether [`load_metadata`](Self::load_metadata) has completed.
    pub fn is_metadata_loaded(&self) -> bool {
        self.meta().loaded
    }

    /// Whether the store was opened with [`open_read_only`](Self::open_read_only).
    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }

    /// Whether the store has been closed.
    pub fn is_closed(&self) -> bool {
        self.meta().closed
    }

    /// Read the persisted metadata into memory.
    ///
    /// On a writable store, a database belonging to a different account has
    /// all of its session data deleted and the store starts empty for this
    /// account. A read-only store returns [`StoreError::ForeignOwner`] for
    /// such a database and leaves it as it is. Calling this again reloads
    /// from disk and discards uncommitted changes.
    pub async fn load_metadata(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let owner = self.credentials.clone();
        let (token, account_data) = match self.access {
            Access::ReadWrite => self.blocking(move |conn| load_or_claim(conn, &owner)).await?,
            Access::ReadOnly => self.blocking(move |conn| load_owned(conn, &owner)).await?,
        };

        tracing::debug!(
            user_id = %self.credentials.user_id,
            has_token = token.is_some(),
            "loaded session store metadata"
        );

        let mut meta = self.meta_mut();
        meta.loaded = true;
        meta.event_stream_token = token;
        meta.user_account_data = account_data;
        meta.dirty = false;
        Ok(())
    }

    fn meta(&self) -> RwLockReadGuard<'_, Metadata> {
        self.metadata.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn meta_mut(&self) -> RwLockWriteGuard<'_, Metadata> {
        self.metadata.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(StoreError::ReadOnly),
        }
    }

    /// Run a database operation on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

type LoadedMetadata = (Option<EventStreamToken>, Option<AccountData>);

/// The persisted metadata row, still encoded.
struct StoredMetadata {
    user_id: String,
    homeserver: String,
    event_stream_token: Option<String>,
    user_account_data: Option<String>,
}

impl StoredMetadata {
    fn is_owned_by(&self, owner: &Credentials) -> bool {
        self.user_id == owner.user_id.as_str() && owner.is_on_homeserver(&self.homeserver)
    }

    fn decode(self) -> Result<LoadedMetadata> {
        let token = self
            .event_stream_token
            .map(EventStreamToken::new)
            .transpose()
            .map_err(|e| StoreError::InvalidData(format!("event stream token: {}", e)))?;
        let account_data = self
            .user_account_data
            .map(|json| serde_json::from_str::<AccountData>(&json))
            .transpose()?;
        Ok((token, account_data))
    }
}

fn read_metadata(conn: &Connection) -> Result<Option<StoredMetadata>> {
    Ok(conn
        .query_row(
            "SELECT user_id, homeserver, event_stream_token, user_account_data
             FROM metadata WHERE id = 1",
            [],
            |row| {
                Ok(StoredMetadata {
                    user_id: row.get(0)?,
                    homeserver: row.get(1)?,
                    event_stream_token: row.get(2)?,
                    user_account_data: row.get(3)?,
                })
            },
        )
        .optional()?)
}

/// Read the metadata row, claiming the database for `owner` if it is missing
/// or belongs to someone else.
fn load_or_claim(conn: &mut Connection, owner: &Credentials) -> Result<LoadedMetadata> {
    match read_metadata(conn)? {
        Some(stored) if stored.is_owned_by(owner) => stored.decode(),
        Some(stored) => {
            tracing::warn!(
                stored_user_id = %stored.user_id,
                stored_homeserver = %stored.homeserver,
                user_id = %owner.user_id,
                "session store belongs to another account, wiping it"
            );
            let tx = conn.transaction()?;
            tx.execute_batch(
                "DELETE FROM room_state;
                 DELETE FROM room_summaries;
                 DELETE FROM room_account_data;
                 DELETE FROM users;
                 DELETE FROM metadata;",
            )?;
            claim(&tx, owner)?;
            tx.commit()?;
            Ok((None, None))
        }
        None => {
            claim(conn, owner)?;
            Ok((None, None))
        }
    }
}

/// Read the metadata row without claiming or wiping anything.
///
/// A database nobody has claimed yet reads as empty.
fn load_owned(conn: &Connection, owner: &Credentials) -> Result<LoadedMetadata> {
    match read_metadata(conn)? {
        Some(stored) if stored.is_owned_by(owner) => stored.decode(),
        Some(stored) => Err(StoreError::ForeignOwner {
            user_id: stored.user_id,
            homeserver: stored.homeserver,
        }),
        None => Ok((None, None)),
    }
}

/// Write a fresh metadata row for `owner`.
fn claim(conn: &Connection, owner: &Credentials) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (id, user_id, homeserver, device_id, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4)",
        params![
            owner.user_id.as_str(),
            &owner.homeserver,
            owner.device_id.as_ref().map(|d| d.as_str()),
            now_millis(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileStore {
    fn event_stream_token(&self) -> Option<EventStreamToken> {
        self.meta().event_stream_token.clone()
    }

    fn set_event_stream_token(&self, token: Option<EventStreamToken>) {
        if self.is_read_only() {
            tracing::warn!("ignoring event stream token update on read-only store");
            return;
        }
        let mut meta = self.meta_mut();
        if meta.closed {
            tracing::warn!("ignoring event stream token update on closed store");
            return;
        }
        meta.event_stream_token = token;
        meta.dirty = true;
        meta.generation += 1;
    }

    fn user_account_data(&self) -> Option<AccountData> {
        self.meta().user_account_data.clone()
    }

    fn set_user_account_data(&self, data: Option<AccountData>) {
        if self.is_read_only() {
            tracing::warn!("ignoring account data update on read-only store");
            return;
        }
        let mut meta = self.meta_mut();
        if meta.closed {
            tracing::warn!("ignoring account data update on closed store");
            return;
        }
        meta.user_account_data = data;
        meta.dirty = true;
        meta.generation += 1;
    }

    fn is_permanent(&self) -> bool {
        true
    }

    async fn store_state(&self, room_id: &RoomId, state_events: &[StateEvent]) -> Result<()> {
        self.ensure_writable()?;
        let room_id = room_id.clone();
        let rows = state_events
            .iter()
            .map(|event| -> Result<(String, String, String)> {
                Ok((
                    event.event_type.clone(),
                    event.state_key.clone(),
                    serde_json::to_string(event)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            for (event_type, state_key, json) in &rows {
                tx.execute(
                    "INSERT INTO room_state (room_id, event_type, state_key, event_json)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(room_id, event_type, state_key) DO UPDATE SET
                        event_json = excluded.event_json",
                    params![room_id.as_str(), event_type, state_key, json],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn room_state(&self, room_id: &RoomId) -> Result<Vec<StateEvent>> {
        let room_id = room_id.clone();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT event_json FROM room_state WHERE room_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map(params![room_id.as_str()], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.iter()
                .map(|json| serde_json::from_str(json).map_err(StoreError::from))
                .collect()
        })
        .await
    }

    async fn store_room_summary(&self, summary: &RoomSummary) -> Result<()> {
        self.ensure_writable()?;
        let room_id = summary.room_id.clone();
        let json = serde_json::to_string(summary)?;

        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO room_summaries (room_id, summary_json) VALUES (?1, ?2)",
                params![room_id.as_str(), json],
            )?;
            Ok(())
        })
        .await
    }

    async fn room_summary(&self, room_id: &RoomId) -> Result<Option<RoomSummary>> {
        let room_id = room_id.clone();

        self.blocking(move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT summary_json FROM room_summaries WHERE room_id = ?1",
                    params![room_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
        })
        .await
    }

    async fn store_room_account_data(
        &self,
        room_id: &RoomId,
        account_data: &RoomAccountData,
    ) -> Result<()> {
        self.ensure_writable()?;
        let room_id = room_id.clone();
        let json = serde_json::to_string(account_data)?;

        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO room_account_data (room_id, account_data_json)
                 VALUES (?1, ?2)",
                params![room_id.as_str(), json],
            )?;
            Ok(())
        })
        .await
    }

    async fn room_account_data(&self, room_id: &RoomId) -> Result<Option<RoomAccountData>> {
        let room_id = room_id.clone();

        self.blocking(move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT account_data_json FROM room_account_data WHERE room_id = ?1",
                    params![room_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
        })
        .await
    }

    async fn store_user(&self, user: &User) -> Result<()> {
        self.ensure_writable()?;
        let user_id = user.user_id.clone();
        let json = serde_json::to_string(user)?;

        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO users (user_id, user_json) VALUES (?1, ?2)",
                params![user_id.as_str(), json],
            )?;
            Ok(())
        })
        .await
    }

    async fn user(&self, user_id: &UserId) -> Result<Option<User>> {
        let user_id = user_id.clone();

        self.blocking(move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT user_json FROM users WHERE user_id = ?1",
                    params![user_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
        })
        .await
    }

    async fn commit(&self) -> Result<()> {
        let (token, account_data, generation) = {
            let meta = self.meta();
            if meta.closed {
                return Err(StoreError::Closed);
            }
            if !meta.dirty {
                return Ok(());
            }
            if !meta.loaded {
                return Err(StoreError::InvalidData(
                    "metadata must be loaded before it can be committed".into(),
                ));
            }
            (
                meta.event_stream_token.clone(),
                meta.user_account_data.clone(),
                meta.generation,
            )
        };

        let account_data_json = account_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.blocking(move |conn| {
            conn.execute(
                "UPDATE metadata SET event_stream_token = ?1, user_account_data = ?2,
                    updated_at = ?3
                 WHERE id = 1",
                params![
                    token.as_ref().map(|t| t.as_str()),
                    account_data_json,
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await?;

        let mut meta = self.meta_mut();
        if meta.generation == generation {
            meta.dirty = false;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.is_closed() {
            tracing::debug!("session store already closed");
            return Ok(());
        }

        self.commit().await?;

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let taken = conn.lock().unwrap_or_else(PoisonError::into_inner).take();
            match taken {
                Some(conn) => conn.close().map_err(|(_, e)| StoreError::from(e)),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))??;

        *self.meta_mut() = Metadata {
            closed: true,
            ..Metadata::default()
        };

        tracing::info!(user_id = %self.credentials.user_id, "closed session store");
        Ok(())
    }
}
