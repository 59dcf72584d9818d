//! SQLite cache backend
//!
//! Durable store for feature values that must outlive the process,
//! scoped to one monitor. Values are serialized as JSON.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::DriftError;
use crate::logic::features::FeatureValue;

use super::FeatureCache;

pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: &Path) -> Result<Self, DriftError> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS feature_values (
                feature TEXT NOT NULL,
                id      TEXT NOT NULL,
                value   TEXT NOT NULL,
                PRIMARY KEY (feature, id)
            )",
            [],
        )?;
        log::info!("Opened feature cache: {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, useful for tests
    pub fn open_in_memory() -> Result<Self, DriftError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS feature_values (
                feature TEXT NOT NULL,
                id      TEXT NOT NULL,
                value   TEXT NOT NULL,
                PRIMARY KEY (feature, id)
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl FeatureCache for SqliteCache {
    fn fetch(&self, feature: &str, ids: &[String]) -> Result<Vec<Option<FeatureValue>>, DriftError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached("SELECT value FROM feature_values WHERE feature = ?1 AND id = ?2")?;

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let raw: Option<String> = stmt
                .query_row(params![feature, id], |row| row.get(0))
                .optional()?;
            match raw {
                Some(json) => out.push(Some(serde_json::from_str(&json)?)),
                None => out.push(None),
            }
        }
        Ok(out)
    }

    fn upsert(&self, feature: &str, ids: &[String], values: &[FeatureValue]) -> Result<(), DriftError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO feature_values (feature, id, value) VALUES (?1, ?2, ?3)",
            )?;
            for (id, value) in ids.iter().zip(values) {
                let json = serde_json::to_string(value)?;
                stmt.execute(params![feature, id, json])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
