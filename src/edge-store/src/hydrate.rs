use std::collections::HashMap;

use ahash::AHashSet;
use anyhow::{Context, Result};
use log::{info, warn};
use rusqlite::params;

use bgc::{Cds, Dataset, Gbk, Record, RecordKind, SourceType, Strand};

use crate::store::Store;

/// Raw `bgc_record` row, staged before arena construction so that
/// protocluster/protocore parent links can be resolved in a second pass.
struct RecordRow {
    db_id      : i64,
    gbk_id     : i64,
    parent_id  : Option<i64>,
    record_type: String,
    nt_start   : usize,
    nt_stop    : usize,
    product    : String,
    category   : Option<String>,
}

impl Store {
    /// Hydrate the in-memory record arena from the database.
    ///
    /// GBKs receive their CDS ordered by start coordinate; records receive
    /// the index range of the CDS fully contained in their nucleotide range.
    /// A protocluster's core CDS indices are derived from the nucleotide
    /// ranges of its child protocore records.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let mut dataset = Dataset::new();

        // ---- GBKs, in id order.
        let mut gbk_arena_idx: HashMap<i64, usize> = HashMap::new();
        {
            let mut statement = self
                .conn
                .prepare("SELECT id, path, source_type FROM gbk ORDER BY id")?;
            let rows = statement.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?;
            for row in rows {
                let (db_id, path, source_type) = row?;
                let source_type: SourceType = source_type
                    .parse()
                    .with_context(|| format!("While loading gbk {db_id}"))?;
                let arena_idx = dataset.add_gbk(Gbk::new(db_id, path, source_type));
                gbk_arena_idx.insert(db_id, arena_idx);
            }
        }

        // ---- CDS, attached to their GBK in genomic order.
        // Arena index of each CDS within its GBK, keyed by CDS db id, so
        // HSPs can find their gene below.
        let mut cds_arena_idx: HashMap<i64, (usize, usize)> = HashMap::new();
        {
            let mut statement = self.conn.prepare(
                "SELECT id, gbk_id, nt_start, nt_stop, strand, gene_kind
                 FROM cds ORDER BY gbk_id, nt_start, nt_stop",
            )?;
            let rows = statement.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?;
            for row in rows {
                let (db_id, gbk_id, nt_start, nt_stop, strand, gene_kind) = row?;
                let Some(&gbk_idx) = gbk_arena_idx.get(&gbk_id) else {
                    warn!("CDS {db_id} references unknown gbk {gbk_id}. Skipping.");
                    continue;
                };
                let strand = Strand::try_from(strand)
                    .with_context(|| format!("While loading cds {db_id}"))?;
                let gene_kind = gene_kind.parse().unwrap_or(bgc::GeneKind::Other);
                let genes = dataset_gbk_genes(&mut dataset, gbk_idx);
                genes.push(Cds::new(nt_start as usize, nt_stop as usize, strand, gene_kind));
                cds_arena_idx.insert(db_id, (gbk_idx, genes.len() - 1));
            }
        }

        // ---- HSPs with their optional alignments.
        {
            let mut statement = self.conn.prepare(
                "SELECT h.id, h.cds_id, h.accession, h.bit_score, h.env_start, h.env_stop, a.alignment
                 FROM hsp h LEFT JOIN hsp_alignment a ON a.hsp_id = h.id
                 ORDER BY h.cds_id, h.env_start, h.id",
            )?;
            let rows = statement.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?;
            for row in rows {
                let (db_id, cds_id, accession, bit_score, env_start, env_stop, alignment) = row?;
                let Some(&(gbk_idx, gene_idx)) = cds_arena_idx.get(&cds_id) else {
                    warn!("HSP {db_id} references unknown cds {cds_id}. Skipping.");
                    continue;
                };
                let mut hsp = bgc::Hsp::new(accession, bit_score, env_start as usize, env_stop as usize);
                if let Some(align_string) = alignment {
                    hsp = hsp.with_alignment(align_string);
                }
                dataset_gbk_genes(&mut dataset, gbk_idx)[gene_idx].hsps.push(hsp);
            }
        }

        // ---- Records: stage the raw rows, then build with parent links.
        let record_rows = self.fetch_record_rows()?;

        for record_row in &record_rows {
            let Some(&gbk_idx) = gbk_arena_idx.get(&record_row.gbk_id) else {
                warn!(
                    "Record {} references unknown gbk {}. Skipping.",
                    record_row.db_id, record_row.gbk_id
                );
                continue;
            };
            let cds_range = cds_range_for(
                &dataset.gbks()[gbk_idx].genes,
                record_row.nt_start,
                record_row.nt_stop,
            );

            let kind = match record_row.record_type.as_str() {
                "region" => RecordKind::Region,
                "proto_core" => RecordKind::ProtoCore { category: record_row.category.clone() },
                "proto_cluster" => {
                    let proto_core_cds_idx = proto_core_indices(
                        record_row,
                        &record_rows,
                        &dataset.gbks()[gbk_idx].genes[cds_range.clone()],
                    );
                    RecordKind::ProtoCluster {
                        category: record_row.category.clone(),
                        proto_core_cds_idx,
                    }
                }
                other => {
                    warn!("Record {} has unknown type '{other}'. Treating as region.", record_row.db_id);
                    RecordKind::Region
                }
            };

            dataset
                .add_record(Record {
                    db_id: Some(record_row.db_id),
                    parent_db_id: record_row.parent_id,
                    gbk_idx,
                    nt_start: record_row.nt_start,
                    nt_stop: record_row.nt_stop,
                    product: record_row.product.clone(),
                    kind,
                    cds_range,
                })
                .with_context(|| format!("While loading record {}", record_row.db_id))?;
        }

        info!(
            "Loaded {} records across {} gbk files",
            dataset.records().len(),
            dataset.gbks().len()
        );
        Ok(dataset)
    }

    fn fetch_record_rows(&self) -> Result<Vec<RecordRow>> {
        let mut statement = self.conn.prepare(
            "SELECT id, gbk_id, parent_id, record_type, nt_start, nt_stop, product, category
             FROM bgc_record ORDER BY id",
        )?;
        let rows = statement.query_map(params![], |row| {
            Ok(RecordRow {
                db_id      : row.get(0)?,
                gbk_id     : row.get(1)?,
                parent_id  : row.get(2)?,
                record_type: row.get(3)?,
                nt_start   : row.get::<_, i64>(4)? as usize,
                nt_stop    : row.get::<_, i64>(5)? as usize,
                product    : row.get(6)?,
                category   : row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().context("While loading bgc_record rows")
    }
}

fn dataset_gbk_genes(dataset: &mut Dataset, gbk_idx: usize) -> &mut Vec<Cds> {
    &mut dataset.gbks_mut()[gbk_idx].genes
}

/// Index range of the CDS fully contained in `[nt_start, nt_stop]`, within
/// a gene list sorted by start coordinate.
fn cds_range_for(genes: &[Cds], nt_start: usize, nt_stop: usize) -> std::ops::Range<usize> {
    let start = genes.partition_point(|cds| cds.nt_start < nt_start);
    let mut stop = start;
    while stop < genes.len() && genes[stop].nt_start <= nt_stop {
        if genes[stop].nt_stop > nt_stop {
            break;
        }
        stop += 1;
    }
    start..stop
}

/// Relative indices (within the protocluster's CDS slice) of CDS contained
/// in any child protocore's nucleotide range.
fn proto_core_indices(
    cluster: &RecordRow,
    all_rows: &[RecordRow],
    cluster_genes: &[Cds],
) -> AHashSet<usize> {
    let core_ranges: Vec<(usize, usize)> = all_rows
        .iter()
        .filter(|row| row.parent_id == Some(cluster.db_id) && row.record_type == "proto_core")
        .map(|row| (row.nt_start, row.nt_stop))
        .collect();

    let mut indices = AHashSet::new();
    for (idx, cds) in cluster_genes.iter().enumerate() {
        if core_ranges
            .iter()
            .any(|&(core_start, core_stop)| cds.nt_start >= core_start && cds.nt_stop <= core_stop)
        {
            indices.insert(idx);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seed one gbk with three CDS, a region spanning all of them and a
    /// protocluster + protocore pair covering the middle gene.
    fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.conn.execute_batch(
            "INSERT INTO gbk VALUES (1, '/data/sample.gbk', 'query');
             INSERT INTO cds VALUES (10, 1, 0,    900,  1, 'other');
             INSERT INTO cds VALUES (11, 1, 1000, 1900, 1, 'biosynthetic');
             INSERT INTO cds VALUES (12, 1, 2000, 2900, -1, 'transport');
             INSERT INTO hsp VALUES (100, 10, 'PF00001', 50.0, 0, 100);
             INSERT INTO hsp VALUES (101, 11, 'PF00109', 250.0, 0, 200);
             INSERT INTO hsp_alignment VALUES (101, 'MAGIC--SEQ');
             INSERT INTO bgc_record VALUES (1, 1, NULL, 'region',        1, 0,    2900, 't1pks', NULL);
             INSERT INTO bgc_record VALUES (2, 1, 1,    'proto_cluster', 1, 500,  2900, 't1pks', 'PKS');
             INSERT INTO bgc_record VALUES (3, 1, 2,    'proto_core',    1, 950,  1950, 't1pks', 'PKS');",
        ).unwrap();
        store
    }

    #[test]
    fn hydrates_gbk_cds_and_hsps() {
        let dataset = seeded_store().load_dataset().unwrap();
        assert_eq!(dataset.gbks().len(), 1);
        assert_eq!(dataset.gbks()[0].genes.len(), 3);
        assert_eq!(dataset.gbks()[0].source_type, SourceType::Query);

        let genes = &dataset.gbks()[0].genes;
        assert_eq!(genes[0].hsps.len(), 1);
        assert_eq!(genes[1].hsps.len(), 1);
        assert!(genes[1].hsps[0].alignment.is_some());
        assert!(genes[0].hsps[0].alignment.is_none());
    }

    #[test]
    fn record_cds_ranges() {
        let dataset = seeded_store().load_dataset().unwrap();
        assert_eq!(dataset.records().len(), 3);

        // region spans every CDS; protocluster and protocore exclude the
        // first gene (starts before their range).
        assert_eq!(dataset.record(0).cds_range, 0..3);
        assert_eq!(dataset.record(1).cds_range, 1..3);
        assert_eq!(dataset.record(2).cds_range, 1..2);
    }

    #[test]
    fn protocore_indices_derive_from_children() {
        let dataset = seeded_store().load_dataset().unwrap();
        let cluster = dataset.record(1);
        let core_idx = cluster.proto_core_cds_idx().unwrap();
        // relative to the protocluster's slice (CDS 11, 12): only CDS 11
        // falls inside the protocore's 950..1950 range.
        assert_eq!(core_idx.len(), 1);
        assert!(core_idx.contains(&0));
    }
}
