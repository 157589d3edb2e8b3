//! SQLite implementation of the vector store, using the `sqlite-vec`
//! extension for vector storage and distance functions.

use std::os::raw::c_char;
use std::sync::{Mutex, Once};

use tokio::fs;
use tokio_rusqlite::{Connection, OptionalExtension, ffi};
use tracing::{debug, info};

use super::{PLACEHOLDER_TEXT, SearchHit, StoreLocation, VectorRow};
use crate::types::FerryError;

/// Handle to one store database.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Connection,
}

impl SqliteVectorStore {
    /// Connects to the database behind `location`, creating the file and its
    /// parent directory on first use, and verifies the vector extension is
    /// answering.
    pub async fn connect(location: &StoreLocation) -> Result<Self, FerryError> {
        register_sqlite_vec()?;

        let path = location.database_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| FerryError::Connection(err.to_string()))?;
            }
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|err| FerryError::Connection(err.to_string()))?;
        let version = conn
            .call(|conn| Ok(conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))?))
            .await
            .map_err(|err: tokio_rusqlite::Error| {
                FerryError::Connection(format!("vec_version probe: {err}"))
            })?;

        debug!(path = %path.display(), vec_version = %version, "store connected");
        Ok(Self { conn })
    }

    /// Opens the named table, creating and seeding it when absent.
    ///
    /// A table is a rows table `<name>` plus a vec0 companion
    /// `<name>_vectors` joined by rowid. Creation writes the
    /// [`PLACEHOLDER_TEXT`] row with a zero vector so both tables agree on
    /// rowids from the start. Probe, create, and seed run in one
    /// transaction: of two racing callers, the loser sees the winner's
    /// table.
    pub async fn open_or_create_table(
        &self,
        name: &str,
        vector_width: usize,
    ) -> Result<VectorTable, FerryError> {
        validate_table_name(name)?;
        if vector_width == 0 {
            return Err(FerryError::Table("vector width must be positive".to_string()));
        }

        let rows_table = name.to_string();
        let vectors_table = format!("{name}_vectors");
        let seed_vector = serde_json::to_string(&vec![0.0f32; vector_width])
            .map_err(|err| FerryError::Table(err.to_string()))?;

        let (rows, vectors) = (rows_table.clone(), vectors_table.clone());
        let created = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let existing: Option<String> = tx
                    .query_row(
                        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                        [rows.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;

                let created = if existing.is_none() {
                    tx.execute(&format!(r#"CREATE TABLE "{rows}" (text TEXT NOT NULL)"#), [])?;
                    tx.execute(
                        &format!(
                            r#"CREATE VIRTUAL TABLE "{vectors}" USING vec0(embedding float[{vector_width}])"#
                        ),
                        [],
                    )?;
                    tx.execute(
                        &format!(r#"INSERT INTO "{rows}" (text) VALUES (?1)"#),
                        [PLACEHOLDER_TEXT],
                    )?;
                    let rowid = tx.last_insert_rowid();
                    tx.execute(
                        &format!(
                            r#"INSERT INTO "{vectors}" (rowid, embedding) VALUES (?1, vec_f32(?2))"#
                        ),
                        (rowid, seed_vector.as_str()),
                    )?;
                    true
                } else {
                    false
                };
                tx.commit()?;
                Ok(created)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| FerryError::Table(err.to_string()))?;

        if created {
            info!(table = %rows_table, vector_width, "vector table created and seeded");
        }
        Ok(VectorTable {
            conn: self.conn.clone(),
            rows_table,
            vectors_table,
            width: vector_width,
        })
    }
}

/// One open vector table.
#[derive(Clone, Debug)]
pub struct VectorTable {
    conn: Connection,
    rows_table: String,
    vectors_table: String,
    width: usize,
}

impl VectorTable {
    pub fn name(&self) -> &str {
        &self.rows_table
    }

    pub fn vector_width(&self) -> usize {
        self.width
    }

    /// Appends one row per (text, vector) pair and returns how many were
    /// written. No deduplication: rows upserted twice exist twice.
    pub async fn upsert_rows(&self, rows: Vec<VectorRow>) -> Result<usize, FerryError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if let Some(row) = rows.iter().find(|row| row.vector.len() != self.width) {
            return Err(FerryError::Table(format!(
                "row vector width {} does not match table width {}",
                row.vector.len(),
                self.width
            )));
        }

        let mut encoded = Vec::with_capacity(rows.len());
        for row in rows {
            let vector = serde_json::to_string(&row.vector)
                .map_err(|err| FerryError::Table(err.to_string()))?;
            encoded.push((row.text, vector));
        }

        let (rows_table, vectors_table) = (self.rows_table.clone(), self.vectors_table.clone());
        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut insert_text =
                        tx.prepare(&format!(r#"INSERT INTO "{rows_table}" (text) VALUES (?1)"#))?;
                    let mut insert_vector = tx.prepare(&format!(
                        r#"INSERT INTO "{vectors_table}" (rowid, embedding) VALUES (?1, vec_f32(?2))"#
                    ))?;
                    for (text, vector) in &encoded {
                        insert_text.execute([text.as_str()])?;
                        let rowid = tx.last_insert_rowid();
                        insert_vector.execute((rowid, vector.as_str()))?;
                    }
                }
                tx.commit()?;
                Ok(encoded.len())
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| FerryError::Table(err.to_string()))?;

        debug!(table = %self.rows_table, rows = inserted, "rows appended");
        Ok(inserted)
    }

    /// The `k` nearest rows to `query` by L2 distance, nearest first.
    pub async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>, FerryError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let encoded =
            serde_json::to_string(query).map_err(|err| FerryError::Table(err.to_string()))?;
        let sql = format!(
            r#"SELECT r.text, vec_distance_l2(v.embedding, vec_f32(?1)) AS distance
               FROM "{rows}" AS r
               JOIN "{vectors}" AS v ON v.rowid = r.rowid
               ORDER BY distance ASC
               LIMIT {k}"#,
            rows = self.rows_table,
            vectors = self.vectors_table,
        );

        let hits = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let mapped = stmt.query_map([encoded.as_str()], |row| {
                    Ok(SearchHit {
                        text: row.get(0)?,
                        metadata: serde_json::Map::new(),
                        distance: row.get(1)?,
                    })
                })?;
                let mut hits = Vec::new();
                for hit in mapped {
                    hits.push(hit?);
                }
                Ok(hits)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| FerryError::Table(err.to_string()))?;
        Ok(hits)
    }

    /// Number of rows in the table, the placeholder included.
    pub async fn count_rows(&self) -> Result<usize, FerryError> {
        let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, self.rows_table);
        let count = self
            .conn
            .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?))
            .await
            .map_err(|err: tokio_rusqlite::Error| FerryError::Table(err.to_string()))?;
        Ok(count as usize)
    }
}

/// Table names are interpolated into DDL, so anything outside
/// `[A-Za-z0-9_-]` is rejected before it gets near SQL.
fn validate_table_name(name: &str) -> Result<(), FerryError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(FerryError::Table(format!(
            "table name '{name}' contains characters outside [A-Za-z0-9_-]"
        )))
    }
}

/// Registers `sqlite-vec` as an auto-loaded extension, once per process.
///
/// Subsequent calls return the outcome of the first registration.
fn register_sqlite_vec() -> Result<(), FerryError> {
    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                std::mem::transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc == ffi::SQLITE_OK {
                Ok(())
            } else {
                Err(format!("sqlite3_auto_extension returned {rc}"))
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .unwrap_or_else(|| Err("sqlite-vec registration ran but recorded no result".to_string()))
        .map_err(FerryError::Connection)
}
