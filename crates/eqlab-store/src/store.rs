//! The artifact store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::records::{AxiomRecord, ImplicationRecord, ModelRecord, NoteRecord, RunRecord};
use crate::schema::SCHEMA;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn utc_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn digest_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn check_digest(digest: &str) -> StoreResult<()> {
    let well_formed =
        digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !well_formed {
        return Err(StoreError::InvalidArgument(format!(
            "malformed digest: {digest}"
        )));
    }
    Ok(())
}

/// Canonical compact JSON: `serde_json::Map` keeps keys sorted, so encoding
/// a `Value` directly is stable.
fn stable_json(value: &Value) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// `(value, value_json)` column pair for one metric value. Numbers go into
/// the float column, booleans widen to 0.0/1.0, null stays null everywhere,
/// anything structured lands in `value_json`.
fn metric_payload(value: &Value) -> StoreResult<(Option<f64>, Option<String>)> {
    Ok(match value {
        Value::Null => (None, None),
        Value::Bool(flag) => (Some(if *flag { 1.0 } else { 0.0 }), None),
        Value::Number(number) => (number.as_f64(), None),
        other => (None, Some(stable_json(other)?)),
    })
}

/// Content-addressed blob store plus relational index.
///
/// The store owns no open connection: every operation opens one, runs a
/// short transaction, and closes it.
pub struct ArtifactStore {
    root: PathBuf,
    db_path: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) a store rooted at the given directory.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("artifacts"))?;
        let db_path = root.join("store.db");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { root, db_path })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn artifact_path(&self, digest: &str) -> PathBuf {
        self.root.join("artifacts").join(&digest[..2]).join(digest)
    }

    /// Write a blob, returning its digest. Idempotent: an existing blob of
    /// the same digest is left untouched.
    pub fn write_bytes(&self, kind: &str, data: &[u8]) -> StoreResult<String> {
        let digest = digest_bytes(data);
        let path = self.artifact_path(&digest);
        if !path.exists() {
            fs::create_dir_all(path.parent().expect("artifact path has a parent"))?;
            fs::write(&path, data)?;
        }
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR IGNORE INTO artifacts(digest, kind, size, created_at) VALUES (?1, ?2, ?3, ?4)",
            (&digest, kind, data.len() as i64, utc_now()),
        )?;
        debug!(digest = %digest, kind, size = data.len(), "blob written");
        Ok(digest)
    }

    pub fn write_json(&self, kind: &str, value: &Value) -> StoreResult<String> {
        self.write_bytes(kind, stable_json(value)?.as_bytes())
    }

    pub fn read_bytes(&self, digest: &str) -> StoreResult<Vec<u8>> {
        check_digest(digest)?;
        let path = self.artifact_path(digest);
        if !path.exists() {
            return Err(StoreError::NotFound(format!("artifact {digest}")));
        }
        Ok(fs::read(path)?)
    }

    pub fn read_json(&self, digest: &str) -> StoreResult<Value> {
        Ok(serde_json::from_slice(&self.read_bytes(digest)?)?)
    }

    pub fn record_run(&self, record: &RunRecord) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO runs(run_id, created_at, spec_json, battery_config_json, manifest_digest, results_digest)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &record.run_id,
                utc_now(),
                stable_json(&record.spec)?,
                stable_json(&record.battery_config)?,
                &record.manifest_digest,
                &record.results_digest,
            ),
        )?;
        Ok(())
    }

    /// `None` when the run id is unknown; callers wrap that into an error.
    pub fn load_run(&self, run_id: &str) -> StoreResult<Option<RunRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT spec_json, battery_config_json, manifest_digest, results_digest
                 FROM runs WHERE run_id = ?1",
                [run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(spec_json, config_json, manifest_digest, results_digest)| {
            Ok(RunRecord {
                run_id: run_id.to_string(),
                spec: serde_json::from_str(&spec_json)?,
                battery_config: serde_json::from_str(&config_json)?,
                manifest_digest,
                results_digest,
            })
        })
        .transpose()
    }

    pub fn record_axiom(&self, record: &AxiomRecord) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO axioms(run_id, axiom_id, left_term, right_term, symmetry_class, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &record.run_id,
                &record.axiom_id,
                &record.left_term,
                &record.right_term,
                &record.symmetry_class,
                utc_now(),
            ),
        )?;
        Ok(())
    }

    pub fn load_axiom(&self, run_id: &str, axiom_id: &str) -> StoreResult<Option<AxiomRecord>> {
        let conn = self.connect()?;
        Ok(conn
            .query_row(
                "SELECT left_term, right_term, symmetry_class
                 FROM axioms WHERE run_id = ?1 AND axiom_id = ?2",
                [run_id, axiom_id],
                |row| {
                    Ok(AxiomRecord {
                        run_id: run_id.to_string(),
                        axiom_id: axiom_id.to_string(),
                        left_term: row.get(0)?,
                        right_term: row.get(1)?,
                        symmetry_class: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn list_axioms(&self, run_id: &str) -> StoreResult<Vec<AxiomRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT axiom_id, left_term, right_term, symmetry_class
             FROM axioms WHERE run_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([run_id], |row| {
            Ok(AxiomRecord {
                run_id: run_id.to_string(),
                axiom_id: row.get(0)?,
                left_term: row.get(1)?,
                right_term: row.get(2)?,
                symmetry_class: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Earliest recorded axiom of a symmetry class (by `created_at`, then
    /// insertion order). This is the archive-novelty oracle.
    pub fn lookup_axiom_by_symmetry(
        &self,
        symmetry_class: &str,
    ) -> StoreResult<Option<AxiomRecord>> {
        let conn = self.connect()?;
        Ok(conn
            .query_row(
                "SELECT run_id, axiom_id, left_term, right_term, symmetry_class
                 FROM axioms WHERE symmetry_class = ?1
                 ORDER BY created_at, rowid LIMIT 1",
                [symmetry_class],
                |row| {
                    Ok(AxiomRecord {
                        run_id: row.get(0)?,
                        axiom_id: row.get(1)?,
                        left_term: row.get(2)?,
                        right_term: row.get(3)?,
                        symmetry_class: row.get(4)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn axiom_symmetry_exists(&self, symmetry_class: &str) -> StoreResult<bool> {
        Ok(self.lookup_axiom_by_symmetry(symmetry_class)?.is_some())
    }

    pub fn record_models(&self, models: &[ModelRecord]) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO models(run_id, axiom_id, size, status, fingerprint, candidates, elapsed_seconds, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            let created_at = utc_now();
            for record in models {
                stmt.execute((
                    &record.run_id,
                    &record.axiom_id,
                    record.size,
                    &record.status,
                    &record.fingerprint,
                    record.candidates,
                    record.elapsed_seconds,
                    &created_at,
                ))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_models(&self, run_id: &str, axiom_id: &str) -> StoreResult<Vec<ModelRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT size, status, fingerprint, candidates, elapsed_seconds
             FROM models WHERE run_id = ?1 AND axiom_id = ?2 ORDER BY size",
        )?;
        let rows = stmt.query_map([run_id, axiom_id], |row| {
            Ok(ModelRecord {
                run_id: run_id.to_string(),
                axiom_id: axiom_id.to_string(),
                size: row.get(0)?,
                status: row.get(1)?,
                fingerprint: row.get(2)?,
                candidates: row.get(3)?,
                elapsed_seconds: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn record_implications(&self, implications: &[ImplicationRecord]) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO implications(run_id, axiom_id, theory, status, checked_max_size,
                 counterexample_size, counterexample_fingerprint, proof_status, proof_elapsed_seconds, proof_steps_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            let created_at = utc_now();
            for record in implications {
                let proof_steps_json = record
                    .proof_steps
                    .as_ref()
                    .map(stable_json)
                    .transpose()?;
                stmt.execute((
                    &record.run_id,
                    &record.axiom_id,
                    &record.theory,
                    &record.status,
                    record.checked_max_size,
                    record.counterexample_size,
                    &record.counterexample_fingerprint,
                    &record.proof_status,
                    record.proof_elapsed_seconds,
                    proof_steps_json,
                    &created_at,
                ))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_implications(
        &self,
        run_id: &str,
        axiom_id: &str,
    ) -> StoreResult<Vec<ImplicationRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT theory, status, checked_max_size, counterexample_size, counterexample_fingerprint,
             proof_status, proof_elapsed_seconds, proof_steps_json
             FROM implications WHERE run_id = ?1 AND axiom_id = ?2 ORDER BY theory",
        )?;
        let rows = stmt.query_map([run_id, axiom_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (
                theory,
                status,
                checked_max_size,
                counterexample_size,
                counterexample_fingerprint,
                proof_status,
                proof_elapsed_seconds,
                proof_steps_json,
            ) = row?;
            records.push(ImplicationRecord {
                run_id: run_id.to_string(),
                axiom_id: axiom_id.to_string(),
                theory,
                status,
                checked_max_size,
                counterexample_size,
                counterexample_fingerprint,
                proof_status,
                proof_elapsed_seconds,
                proof_steps: proof_steps_json
                    .map(|text| serde_json::from_str(&text))
                    .transpose()?,
            });
        }
        Ok(records)
    }

    pub fn record_metrics(
        &self,
        run_id: &str,
        axiom_id: &str,
        metrics: &BTreeMap<String, Value>,
    ) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO metrics(run_id, axiom_id, name, value, value_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let created_at = utc_now();
            for (name, value) in metrics {
                let (numeric, payload) = metric_payload(value)?;
                stmt.execute((run_id, axiom_id, name, numeric, payload, &created_at))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_metrics(
        &self,
        run_id: &str,
        axiom_id: &str,
    ) -> StoreResult<BTreeMap<String, Value>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT name, value, value_json FROM metrics WHERE run_id = ?1 AND axiom_id = ?2",
        )?;
        let rows = stmt.query_map([run_id, axiom_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut metrics = BTreeMap::new();
        for row in rows {
            let (name, numeric, payload) = row?;
            let value = match payload {
                Some(text) => serde_json::from_str(&text)?,
                None => match numeric {
                    Some(number) => serde_json::json!(number),
                    None => Value::Null,
                },
            };
            metrics.insert(name, value);
        }
        Ok(metrics)
    }

    pub fn add_note(&self, run_id: &str, axiom_id: &str, body: &str) -> StoreResult<NoteRecord> {
        let created_at = utc_now();
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO notes(run_id, axiom_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            (run_id, axiom_id, body, &created_at),
        )?;
        Ok(NoteRecord {
            note_id: conn.last_insert_rowid(),
            run_id: run_id.to_string(),
            axiom_id: axiom_id.to_string(),
            body: body.to_string(),
            created_at,
        })
    }

    pub fn load_notes(&self, run_id: &str, axiom_id: &str) -> StoreResult<Vec<NoteRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT note_id, body, created_at FROM notes
             WHERE run_id = ?1 AND axiom_id = ?2 ORDER BY note_id",
        )?;
        let rows = stmt.query_map([run_id, axiom_id], |row| {
            Ok(NoteRecord {
                note_id: row.get(0)?,
                run_id: run_id.to_string(),
                axiom_id: axiom_id.to_string(),
                body: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
