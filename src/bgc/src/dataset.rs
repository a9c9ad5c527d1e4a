use anyhow::Result;

use crate::cds::Cds;
use crate::domains::DomainSeq;
use crate::gbk::{Gbk, SourceType};
use crate::record::Record;
use crate::ModelError;

/// Arena holding every GBK and record of a run.
///
/// GBKs own their CDS; records address their parent GBK by index and their
/// CDS by an index range into the GBK's gene list. The arena is built once
/// by the hydration layer and is immutable (and freely shareable across
/// worker threads) for the remainder of the run.
#[derive(Debug, Default)]
pub struct Dataset {
    gbks   : Vec<Gbk>,
    records: Vec<Record>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a GBK to the arena, returning its index.
    pub fn add_gbk(&mut self, gbk: Gbk) -> usize {
        self.gbks.push(gbk);
        self.gbks.len() - 1
    }

    /// Append a record to the arena, returning its index.
    ///
    /// # Errors
    /// - if the record addresses an out-of-bounds GBK index.
    /// - if the record's CDS range exceeds its parent GBK's gene list.
    pub fn add_record(&mut self, record: Record) -> Result<usize, ModelError> {
        let gbk = self.gbks.get(record.gbk_idx)
            .ok_or(ModelError::InvalidGbkIndex(record.gbk_idx))?;
        if record.cds_range.end > gbk.genes.len() || record.cds_range.start > record.cds_range.end {
            return Err(ModelError::InvalidCdsRange {
                start: record.cds_range.start,
                stop : record.cds_range.end,
                len  : gbk.genes.len(),
            });
        }
        self.records.push(record);
        Ok(self.records.len() - 1)
    }

    #[must_use]
    pub fn gbks(&self) -> &[Gbk] {
        &self.gbks
    }

    /// Mutable access for the hydration layer. The arena must not be
    /// mutated once comparison work has started.
    pub fn gbks_mut(&mut self) -> &mut [Gbk] {
        &mut self.gbks
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access for the hydration layer. The arena must not be
    /// mutated once comparison work has started.
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    #[must_use]
    pub fn record(&self, idx: usize) -> &Record {
        &self.records[idx]
    }

    /// Bundle a record with its parent GBK for slice access.
    #[must_use]
    pub fn view(&self, idx: usize) -> RecordView<'_> {
        let record = &self.records[idx];
        RecordView { record, gbk: &self.gbks[record.gbk_idx] }
    }
}

/// A record together with its parent GBK.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub record: &'a Record,
    pub gbk   : &'a Gbk,
}

impl<'a> RecordView<'a> {
    /// The record's CDS, in genomic order.
    #[must_use]
    pub fn cds(&self) -> &'a [Cds] {
        &self.gbk.genes[self.record.cds_range.clone()]
    }

    #[must_use]
    pub fn db_id(&self) -> Option<i64> {
        self.record.db_id
    }

    #[must_use]
    pub fn is_query(&self) -> bool {
        self.gbk.source_type == SourceType::Query
    }

    /// Flattened domain sequence of this record, in forward orientation.
    #[must_use]
    pub fn domains(&self) -> DomainSeq<'a> {
        DomainSeq::forward(self.cds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cds::{GeneKind, Strand};
    use crate::hsp::Hsp;
    use crate::record::RecordKind;

    fn mock_gbk(n_cds: usize) -> Gbk {
        let mut gbk = Gbk::new(1, "mock.gbk", SourceType::Query);
        for i in 0..n_cds {
            gbk.genes.push(Cds::new(i * 100, i * 100 + 90, Strand::Forward, GeneKind::Other));
        }
        gbk
    }

    #[test]
    fn record_view_slices_parent_genes() {
        let mut dataset = Dataset::new();
        let gbk_idx = dataset.add_gbk(mock_gbk(5));
        let record_idx = dataset.add_record(Record {
            db_id: Some(10), parent_db_id: None, gbk_idx, nt_start: 100, nt_stop: 400,
            product: "terpene".to_string(), kind: RecordKind::Region, cds_range: 1..4,
        }).unwrap();

        let view = dataset.view(record_idx);
        assert_eq!(view.cds().len(), 3);
        assert_eq!(view.cds()[0].nt_start, 100);
    }

    #[test]
    fn out_of_bounds_cds_range_is_rejected() {
        let mut dataset = Dataset::new();
        let gbk_idx = dataset.add_gbk(mock_gbk(2));
        let result = dataset.add_record(Record {
            db_id: Some(1), parent_db_id: None, gbk_idx, nt_start: 0, nt_stop: 100,
            product: String::new(), kind: RecordKind::Region, cds_range: 0..3,
        });
        assert!(result.is_err());
    }

    #[test]
    fn domain_count_matches_hsp_sum() {
        let mut gbk = mock_gbk(3);
        gbk.genes[0].hsps.push(Hsp::new("PF00001", 50.0, 0, 10));
        gbk.genes[2].hsps.push(Hsp::new("PF00002", 60.0, 0, 10));
        gbk.genes[2].hsps.push(Hsp::new("PF00003", 70.0, 0, 10));

        let mut dataset = Dataset::new();
        let gbk_idx = dataset.add_gbk(gbk);
        let record_idx = dataset.add_record(Record {
            db_id: Some(1), parent_db_id: None, gbk_idx, nt_start: 0, nt_stop: 300,
            product: String::new(), kind: RecordKind::Region, cds_range: 0..3,
        }).unwrap();

        let view = dataset.view(record_idx);
        let total_hsps: usize = view.cds().iter().map(|cds| cds.hsps.len()).sum();
        assert_eq!(view.domains().len(), total_hsps);
    }
}
