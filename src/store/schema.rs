use rusqlite::{
    Connection,
    params,
};

/// Tables every valid store must contain.
pub(super) const TABLES: [&str; 4] = ["platform", "translation_key", "native_translation", "replaced_param"];

/// Schema of a fresh store. Parents come before children so a dump replays
/// in order.
pub(super) const CREATE_SCHEMA: &str = "
CREATE TABLE platform (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE translation_key (
    id INTEGER PRIMARY KEY,
    text TEXT NOT NULL UNIQUE,
    last_updated TEXT NOT NULL
);
CREATE TABLE native_translation (
    id INTEGER PRIMARY KEY,
    translation_key_id INTEGER NOT NULL REFERENCES translation_key (id),
    platform_id INTEGER NOT NULL REFERENCES platform (id),
    text TEXT NOT NULL,
    UNIQUE (translation_key_id, platform_id)
);
CREATE TABLE replaced_param (
    native_translation_id INTEGER NOT NULL REFERENCES native_translation (id),
    platform_id INTEGER NOT NULL REFERENCES platform (id),
    param_index INTEGER NOT NULL,
    text TEXT NOT NULL,
    PRIMARY KEY (native_translation_id, param_index)
);
CREATE INDEX native_translation_platform ON native_translation (platform_id);
";

/// Returns the names of required tables absent from `connection`.
pub(super) fn missing_tables(connection: &Connection) -> rusqlite::Result<Vec<&'static str>> {
    let mut stmt =
        connection.prepare("SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;

    let mut missing = Vec::new();
    for table in TABLES {
        let count: i64 = stmt.query_row(params![table], |row| row.get(0))?;
        if count == 0 {
            missing.push(table);
        }
    }
    Ok(missing)
}
