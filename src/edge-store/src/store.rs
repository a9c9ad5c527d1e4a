use std::path::Path;

use ahash::AHashSet;
use log::debug;
use rusqlite::{params, Connection};

use crate::edge::EdgeRow;
use crate::error::StoreError;

/// Schema of the dataset + edge store database.
///
/// The record tables (`gbk` through `hsp_alignment`) are populated by the
/// annotation pipeline; this crate only reads them. The `distance` and
/// `edge_params` tables are owned by the comparison workflow.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS gbk (
    id          INTEGER PRIMARY KEY,
    path        TEXT NOT NULL,
    source_type TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS bgc_record (
    id            INTEGER PRIMARY KEY,
    gbk_id        INTEGER NOT NULL REFERENCES gbk(id),
    parent_id     INTEGER REFERENCES bgc_record(id),
    record_type   TEXT NOT NULL,
    record_number INTEGER,
    nt_start      INTEGER NOT NULL,
    nt_stop       INTEGER NOT NULL,
    product       TEXT NOT NULL,
    category      TEXT
);
CREATE TABLE IF NOT EXISTS cds (
    id        INTEGER PRIMARY KEY,
    gbk_id    INTEGER NOT NULL REFERENCES gbk(id),
    nt_start  INTEGER NOT NULL,
    nt_stop   INTEGER NOT NULL,
    strand    INTEGER NOT NULL,
    gene_kind TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS hsp (
    id        INTEGER PRIMARY KEY,
    cds_id    INTEGER NOT NULL REFERENCES cds(id),
    accession TEXT NOT NULL,
    bit_score REAL NOT NULL,
    env_start INTEGER NOT NULL,
    env_stop  INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS hsp_alignment (
    hsp_id    INTEGER PRIMARY KEY REFERENCES hsp(id),
    alignment TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS edge_params (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    weights        TEXT NOT NULL,
    alignment_mode TEXT NOT NULL,
    UNIQUE (weights, alignment_mode)
);
CREATE TABLE IF NOT EXISTS distance (
    record_a_id   INTEGER NOT NULL,
    record_b_id   INTEGER NOT NULL,
    distance      REAL NOT NULL,
    jaccard       REAL NOT NULL,
    adjacency     REAL NOT NULL,
    dss           REAL NOT NULL,
    edge_param_id INTEGER NOT NULL REFERENCES edge_params(id),
    lcs_a_start   INTEGER,
    lcs_a_stop    INTEGER,
    lcs_b_start   INTEGER,
    lcs_b_stop    INTEGER,
    ext_a_start   INTEGER,
    ext_a_stop    INTEGER,
    ext_b_start   INTEGER,
    ext_b_stop    INTEGER,
    reverse       BOOLEAN NOT NULL,
    PRIMARY KEY (edge_param_id, record_a_id, record_b_id)
);
CREATE INDEX IF NOT EXISTS idx_distance_records ON distance (record_a_id, record_b_id);
";

/// Handle on the run database. All access is single-threaded: workers never
/// touch the store, only the coordinator reads and writes it.
#[derive(Debug)]
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) the store at `path` and ensure the schema exists.
    ///
    /// # Errors
    /// - `StoreError::Open` if the database cannot be opened.
    /// - `StoreError::Schema` if the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA).map_err(StoreError::Schema)
    }

    /// Resolve the surrogate id of an edge parameter set, inserting it on
    /// first use. Idempotent per `(weights, alignment_mode)`.
    pub fn resolve_edge_param(&self, weights: &str, alignment_mode: &str) -> Result<i64, StoreError> {
        let existing = self
            .conn
            .query_row(
                "SELECT id FROM edge_params WHERE weights = ?1 AND alignment_mode = ?2",
                params![weights, alignment_mode],
                |row| row.get::<_, i64>(0),
            );
        match existing {
            Ok(id) => Ok(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                self.conn.execute(
                    "INSERT INTO edge_params (weights, alignment_mode) VALUES (?1, ?2)",
                    params![weights, alignment_mode],
                )?;
                debug!("Registered edge params ({weights}, {alignment_mode})");
                Ok(self.conn.last_insert_rowid())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist a batch of scored pairs in one transaction.
    ///
    /// Re-inserting an existing `(edge_param_id, a, b)` key replaces the
    /// previous row, so replayed batches are harmless.
    pub fn insert_edges(&mut self, edges: &[EdgeRow]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut statement = tx.prepare_cached(
                "INSERT OR REPLACE INTO distance (
                     record_a_id, record_b_id, distance, jaccard, adjacency, dss,
                     edge_param_id,
                     lcs_a_start, lcs_a_stop, lcs_b_start, lcs_b_stop,
                     ext_a_start, ext_a_stop, ext_b_start, ext_b_stop,
                     reverse
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?;
            for edge in edges {
                statement.execute(params![
                    edge.record_a_id,
                    edge.record_b_id,
                    edge.distance,
                    edge.jaccard,
                    edge.adjacency,
                    edge.dss,
                    edge.edge_param_id,
                    edge.lcs_a_start as i64,
                    edge.lcs_a_stop as i64,
                    edge.lcs_b_start as i64,
                    edge.lcs_b_stop as i64,
                    edge.ext_a_start as i64,
                    edge.ext_a_stop as i64,
                    edge.ext_b_start as i64,
                    edge.ext_b_stop as i64,
                    edge.reverse,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Every stored pair under `edge_param_id` where both records belong to
    /// `record_ids`, in stored orientation.
    pub fn existing_pairs(
        &self,
        edge_param_id: i64,
        record_ids: &AHashSet<i64>,
    ) -> Result<AHashSet<(i64, i64)>, StoreError> {
        let mut statement = self
            .conn
            .prepare_cached("SELECT record_a_id, record_b_id FROM distance WHERE edge_param_id = ?1")?;
        let rows = statement.query_map(params![edge_param_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut pairs = AHashSet::new();
        for row in rows {
            let (id_a, id_b) = row?;
            if record_ids.contains(&id_a) && record_ids.contains(&id_b) {
                pairs.insert((id_a, id_b));
            }
        }
        Ok(pairs)
    }

    /// Number of stored pairs under `edge_param_id` with both records in
    /// `record_ids`.
    pub fn existing_pair_count(
        &self,
        edge_param_id: i64,
        record_ids: &AHashSet<i64>,
    ) -> Result<usize, StoreError> {
        Ok(self.existing_pairs(edge_param_id, record_ids)?.len())
    }

    /// Record ids participating in at least one stored edge with
    /// `distance < 1.0` under `edge_param_id`.
    fn related_record_ids(&self, edge_param_id: i64) -> Result<AHashSet<i64>, StoreError> {
        let mut statement = self.conn.prepare_cached(
            "SELECT record_a_id, record_b_id FROM distance
             WHERE edge_param_id = ?1 AND distance < 1.0",
        )?;
        let rows = statement.query_map(params![edge_param_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut related = AHashSet::new();
        for row in rows {
            let (id_a, id_b) = row?;
            related.insert(id_a);
            related.insert(id_b);
        }
        Ok(related)
    }

    /// Reference records of `reference_ids` that are connected (share at
    /// least one sub-cutoff edge) under `edge_param_id`, excluding records
    /// already marked done. Sorted for deterministic enumeration.
    pub fn connected_reference_ids(
        &self,
        edge_param_id: i64,
        reference_ids: &AHashSet<i64>,
        done_ids: &AHashSet<i64>,
    ) -> Result<Vec<i64>, StoreError> {
        let related = self.related_record_ids(edge_param_id)?;
        let mut connected: Vec<i64> = reference_ids
            .iter()
            .copied()
            .filter(|id| related.contains(id) && !done_ids.contains(id))
            .collect();
        connected.sort_unstable();
        Ok(connected)
    }

    /// Reference records of `reference_ids` with no sub-cutoff edge under
    /// `edge_param_id`. Sorted for deterministic enumeration.
    pub fn singleton_reference_ids(
        &self,
        edge_param_id: i64,
        reference_ids: &AHashSet<i64>,
    ) -> Result<Vec<i64>, StoreError> {
        let related = self.related_record_ids(edge_param_id)?;
        let mut singletons: Vec<i64> = reference_ids
            .iter()
            .copied()
            .filter(|id| !related.contains(id))
            .collect();
        singletons.sort_unstable();
        Ok(singletons)
    }

    /// Total number of stored edges, across parameter sets.
    pub fn edge_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM distance", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
