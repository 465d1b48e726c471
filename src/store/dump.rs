//! Plain-text SQL dumps of the store.
//!
//! A dump is the schema followed by one `INSERT` per row, wrapped in a
//! single transaction. Rows are written in rowid order so that a dump of
//! unchanged data is byte-identical to the previous one.

use std::fmt::Write as _;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

/// Renders every table and index of `connection` as SQL text.
pub(super) fn dump(connection: &Connection) -> rusqlite::Result<String> {
    let mut output = String::from("BEGIN TRANSACTION;\n");

    let objects = {
        let mut stmt = connection.prepare(
            "SELECT type, name, sql FROM sqlite_master
             WHERE sql NOT NULL AND name NOT LIKE 'sqlite_%'
             ORDER BY type = 'index', rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    for (kind, name, sql) in &objects {
        let _ = writeln!(output, "{sql};");
        if kind == "table" {
            dump_rows(connection, name, &mut output)?;
        }
    }

    output.push_str("COMMIT;\n");
    Ok(output)
}

fn dump_rows(connection: &Connection, table: &str, output: &mut String) -> rusqlite::Result<()> {
    let table = quote_identifier(table);
    let mut stmt = connection.prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))?;
    let columns = stmt.column_count();
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns);
        for index in 0..columns {
            values.push(literal(row.get_ref(index)?));
        }
        let _ = writeln!(output, "INSERT INTO {table} VALUES({});", values.join(","));
    }

    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn literal(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(text) => format!("'{}'", String::from_utf8_lossy(text).replace('\'', "''")),
        ValueRef::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for byte in bytes {
                let _ = write!(hex, "{byte:02X}");
            }
            hex.push('\'');
            hex
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn dump_replays_into_identical_database() {
        let source = Connection::open_in_memory().unwrap();
        source
            .execute_batch(
                "CREATE TABLE item (id INTEGER PRIMARY KEY, text TEXT, data BLOB);
                 CREATE INDEX item_text ON item (text);
                 INSERT INTO item (text, data) VALUES ('it''s', X'00FF');
                 INSERT INTO item (text, data) VALUES ('line
break', NULL);",
            )
            .unwrap();

        let first = dump(&source).unwrap();
        let replayed = Connection::open_in_memory().unwrap();
        replayed.execute_batch(&first).unwrap();

        expect_that!(dump(&replayed).unwrap(), eq(&first));
        expect_that!(first, contains_substring("INSERT INTO \"item\" VALUES(1,'it''s',X'00FF');"));
    }

    #[googletest::test]
    fn indexes_follow_tables() {
        let source = Connection::open_in_memory().unwrap();
        source
            .execute_batch(
                "CREATE TABLE a (id INTEGER PRIMARY KEY);
                 CREATE INDEX a_id ON a (id);
                 CREATE TABLE b (id INTEGER PRIMARY KEY);",
            )
            .unwrap();

        let output = dump(&source).unwrap();
        let table_b = output.find("CREATE TABLE b").unwrap();
        let index_a = output.find("CREATE INDEX a_id").unwrap();

        expect_that!(table_b < index_a, eq(true));
    }
}
