use std::collections::{
    BTreeSet,
    HashMap,
};
use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use chrono::TimeDelta;
use indexmap::IndexMap;
use rusqlite::{
    Connection,
    OptionalExtension,
    Transaction,
    params,
};

use super::clock::{
    Clock,
    SystemClock,
    TIMESTAMP_FORMAT,
};
use super::dump::dump;
use super::error::StoreError;
use super::schema::{
    CREATE_SCHEMA,
    missing_tables,
};
use crate::placeholder::{
    denormalize,
    normalize,
};

/// Row counts from one [`SqliteStore::write_string_mapping_for_platform`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// New rows in `translation_key`.
    pub keys_inserted: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl SyncStats {
    /// Number of rows written.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.keys_inserted + self.inserted + self.updated + self.deleted
    }
}

/// A platform's stored string in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTranslation {
    pub canonical: String,
    pub params: Vec<String>,
}

impl NativeTranslation {
    /// Rebuilds the string with this platform's own parameters.
    #[must_use]
    pub fn original(&self) -> String {
        denormalize(&self.canonical, &self.params)
    }
}

/// One `native_translation` row joined with its key and params.
#[derive(Debug)]
struct StoredRow {
    key_id: i64,
    native_id: i64,
    translation: NativeTranslation,
}

/// Translation state backed by an in-memory `SQLite` database and persisted
/// as a SQL dump at `path`.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    connection: Connection,
    clock: Box<dyn Clock>,
}

impl SqliteStore {
    /// Loads the dump at `path`, or creates an empty store if it does not
    /// exist.
    ///
    /// # Errors
    /// Returns [`StoreError::Unavailable`] if the dump cannot be read or
    /// replayed, or lacks any of the store's tables.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let unavailable =
            |reason: String| StoreError::Unavailable { path: path.to_path_buf(), reason };

        let connection = Connection::open_in_memory().map_err(|err| unavailable(err.to_string()))?;

        if path.exists() {
            let content = fs::read_to_string(path).map_err(|err| unavailable(err.to_string()))?;
            connection.execute_batch(&content).map_err(|err| unavailable(err.to_string()))?;

            let missing = missing_tables(&connection).map_err(|err| unavailable(err.to_string()))?;
            if !missing.is_empty() {
                return Err(unavailable(format!("missing tables: {}", missing.join(", "))));
            }
            tracing::debug!(path = %path.display(), "Loaded translation store");
        } else {
            connection.execute_batch(CREATE_SCHEMA).map_err(|err| unavailable(err.to_string()))?;
            tracing::info!(path = %path.display(), "Created new translation store");
        }

        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|err| unavailable(err.to_string()))?;

        Ok(Self { path: path.to_path_buf(), connection, clock: Box::new(SystemClock) })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.set_clock(clock);
        self
    }

    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the dump back to [`Self::path`].
    ///
    /// The dump goes to a sibling temp file first and is renamed over the
    /// old one, so a failed save leaves the previous dump intact.
    ///
    /// # Errors
    /// Returns error if the database cannot be dumped or the file written.
    pub fn save(&self) -> Result<(), StoreError> {
        let content = dump(&self.connection)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, content)
            .map_err(|source| StoreError::Io { path: temp_path.clone(), source })?;
        fs::rename(&temp_path, &self.path)
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;

        tracing::debug!(path = %self.path.display(), "Saved translation store");
        Ok(())
    }

    fn now(&self) -> String {
        self.clock.now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Returns the id of `platform`, adding it if needed.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn get_or_create_platform(&self, platform: &str) -> Result<i64, StoreError> {
        Ok(get_or_create_platform(&self.connection, platform)?)
    }

    /// Reconciles the stored strings of `platform` with `mapping`.
    ///
    /// New keys are added first. Then stored rows absent from `mapping` are
    /// deleted, and changed or new values are written with their params.
    /// Each key whose row changed gets its `last_updated` bumped; identical
    /// values are not touched. Entries whose value is `None` carry no
    /// string, so their stored row (if any) is kept as is.
    ///
    /// Everything runs in one transaction: on error nothing is applied.
    ///
    /// # Errors
    /// Returns error on database failure, or [`StoreError::MissingKey`] if a
    /// key vanished between key and value reconciliation.
    pub fn write_string_mapping_for_platform(
        &mut self,
        platform: &str,
        mapping: &IndexMap<String, Option<String>>,
    ) -> Result<SyncStats, StoreError> {
        let now = self.now();
        let tx = self.connection.transaction()?;
        let platform_id = get_or_create_platform(&tx, platform)?;
        let mut stats = SyncStats::default();

        {
            let mut insert_key = tx.prepare_cached(
                "INSERT OR IGNORE INTO translation_key (text, last_updated) VALUES (?1, ?2)",
            )?;
            for key in mapping.keys() {
                stats.keys_inserted += insert_key.execute(params![key, now])?;
            }
        }

        let stored = platform_rows(&tx, platform_id)?;
        let mut touched = BTreeSet::new();

        for (key, row) in &stored {
            if !mapping.contains_key(key) {
                delete_native_translation(&tx, row.native_id)?;
                touched.insert(row.key_id);
                stats.deleted += 1;
            }
        }

        for (key, value) in mapping {
            let Some(value) = value else {
                tracing::debug!(platform, key = %key, "Skipping string without a value");
                continue;
            };
            let (canonical, params) = normalize(value);

            match stored.get(key) {
                Some(row)
                    if row.translation.canonical == canonical && row.translation.params == params =>
                {
                    stats.unchanged += 1;
                }
                Some(row) => {
                    tx.execute(
                        "UPDATE native_translation SET text = ?1 WHERE id = ?2",
                        params![canonical, row.native_id],
                    )?;
                    tx.execute(
                        "DELETE FROM replaced_param WHERE native_translation_id = ?1",
                        params![row.native_id],
                    )?;
                    insert_params(&tx, row.native_id, platform_id, &params)?;
                    touched.insert(row.key_id);
                    stats.updated += 1;
                }
                None => {
                    let key_id = tx
                        .query_row(
                            "SELECT id FROM translation_key WHERE text = ?1",
                            params![key],
                            |row| row.get::<_, i64>(0),
                        )
                        .optional()?
                        .ok_or_else(|| StoreError::MissingKey(key.clone()))?;
                    tx.execute(
                        "INSERT INTO native_translation (translation_key_id, platform_id, text)
                         VALUES (?1, ?2, ?3)",
                        params![key_id, platform_id, canonical],
                    )?;
                    let native_id = tx.last_insert_rowid();
                    insert_params(&tx, native_id, platform_id, &params)?;
                    touched.insert(key_id);
                    stats.inserted += 1;
                }
            }
        }

        {
            let mut stamp =
                tx.prepare_cached("UPDATE translation_key SET last_updated = ?1 WHERE id = ?2")?;
            for key_id in &touched {
                stamp.execute(params![now, key_id])?;
            }
        }

        tx.commit()?;

        tracing::info!(
            platform,
            keys_inserted = stats.keys_inserted,
            inserted = stats.inserted,
            updated = stats.updated,
            deleted = stats.deleted,
            unchanged = stats.unchanged,
            "Synchronized string mapping"
        );
        Ok(stats)
    }

    /// Deletes keys that no platform uses and that have not changed within
    /// `retention_days`. Returns the number of keys removed.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn remove_old_unmapped_strings(&self, retention_days: u32) -> Result<usize, StoreError> {
        let Some(threshold) = TimeDelta::try_days(i64::from(retention_days))
            .and_then(|retention| self.clock.now().checked_sub_signed(retention))
        else {
            tracing::warn!(retention_days, "Retention period out of range; nothing purged");
            return Ok(0);
        };
        let threshold = threshold.format(TIMESTAMP_FORMAT).to_string();

        let removed = self.connection.execute(
            "DELETE FROM translation_key
             WHERE id NOT IN (SELECT translation_key_id FROM native_translation)
               AND last_updated < ?1",
            params![threshold],
        )?;

        if removed > 0 {
            tracing::info!(removed, %threshold, "Purged unmapped translation keys");
        }
        Ok(removed)
    }

    /// Platform names in the order they were first synchronized.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn get_platforms(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.connection.prepare("SELECT name FROM platform ORDER BY id")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(names.collect::<rusqlite::Result<_>>()?)
    }

    /// # Errors
    /// Returns error on database failure.
    pub fn get_all_translation_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.connection.prepare("SELECT text FROM translation_key ORDER BY id")?;
        let keys = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(keys.collect::<rusqlite::Result<_>>()?)
    }

    /// Key → string as it appears on `platform`, with its own params.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn get_string_mapping_for_platform(
        &self,
        platform: &str,
    ) -> Result<IndexMap<String, String>, StoreError> {
        let Some(platform_id) = platform_id(&self.connection, platform)? else {
            return Ok(IndexMap::new());
        };

        Ok(platform_rows(&self.connection, platform_id)?
            .into_iter()
            .map(|(key, row)| (key, row.translation.original()))
            .collect())
    }

    /// Canonical strings of `platform` with the params they replaced.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn get_native_translations_for_platform(
        &self,
        platform: &str,
    ) -> Result<Vec<NativeTranslation>, StoreError> {
        let Some(platform_id) = platform_id(&self.connection, platform)? else {
            return Ok(Vec::new());
        };

        Ok(platform_rows(&self.connection, platform_id)?
            .into_values()
            .map(|row| row.translation)
            .collect())
    }

    /// Distinct canonical strings across every platform.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn get_all_native_translations(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .connection
            .prepare("SELECT text FROM native_translation GROUP BY text ORDER BY MIN(id)")?;
        let texts = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(texts.collect::<rusqlite::Result<_>>()?)
    }

    /// The `last_updated` stamp of `key`, if the key exists.
    ///
    /// # Errors
    /// Returns error on database failure.
    pub fn last_updated(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .connection
            .query_row(
                "SELECT last_updated FROM translation_key WHERE text = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }
}

fn platform_id(connection: &Connection, platform: &str) -> rusqlite::Result<Option<i64>> {
    connection
        .query_row("SELECT id FROM platform WHERE name = ?1", params![platform], |row| row.get(0))
        .optional()
}

fn get_or_create_platform(connection: &Connection, platform: &str) -> rusqlite::Result<i64> {
    if let Some(id) = platform_id(connection, platform)? {
        return Ok(id);
    }

    connection.execute("INSERT INTO platform (name) VALUES (?1)", params![platform])?;
    tracing::info!(platform, "Added platform to translation store");
    Ok(connection.last_insert_rowid())
}

/// Stored rows of one platform, keyed by translation key text.
fn platform_rows(
    connection: &Connection,
    platform_id: i64,
) -> rusqlite::Result<IndexMap<String, StoredRow>> {
    let mut params_by_native: HashMap<i64, Vec<String>> = HashMap::new();
    {
        let mut stmt = connection.prepare(
            "SELECT native_translation_id, text FROM replaced_param
             WHERE platform_id = ?1
             ORDER BY native_translation_id, param_index",
        )?;
        let rows = stmt.query_map(params![platform_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (native_id, text) = row?;
            params_by_native.entry(native_id).or_default().push(text);
        }
    }

    let mut stmt = connection.prepare(
        "SELECT k.id, k.text, n.id, n.text
         FROM native_translation n
         INNER JOIN translation_key k ON k.id = n.translation_key_id
         WHERE n.platform_id = ?1
         ORDER BY n.id",
    )?;
    let rows = stmt.query_map(params![platform_id], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?, row.get::<_, String>(3)?))
    })?;

    let mut stored = IndexMap::new();
    for row in rows {
        let (key_id, key, native_id, canonical) = row?;
        let params = params_by_native.remove(&native_id).unwrap_or_default();
        stored.insert(
            key,
            StoredRow { key_id, native_id, translation: NativeTranslation { canonical, params } },
        );
    }
    Ok(stored)
}

fn delete_native_translation(tx: &Transaction<'_>, native_id: i64) -> rusqlite::Result<()> {
    tx.execute("DELETE FROM replaced_param WHERE native_translation_id = ?1", params![native_id])?;
    tx.execute("DELETE FROM native_translation WHERE id = ?1", params![native_id])?;
    Ok(())
}

fn insert_params(
    tx: &Transaction<'_>,
    native_id: i64,
    platform_id: i64,
    params: &[String],
) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO replaced_param (native_translation_id, platform_id, param_index, text)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (index, param) in params.iter().enumerate() {
        let index = i64::try_from(index)
            .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(2, i64::MAX))?;
        stmt.execute(params![native_id, platform_id, index, param])?;
    }
    Ok(())
}
