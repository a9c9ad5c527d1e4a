//! Mock dataset builders shared by the unit tests of this crate.

use ahash::AHashSet;
use bgc::{Cds, Dataset, Gbk, GeneKind, Record, RecordKind, SourceType, Strand};

use crate::pair::RecordPair;

pub const BIO: GeneKind = GeneKind::Biosynthetic;
pub const OTHER: GeneKind = GeneKind::Other;

/// (gene kind, domain accessions) of one CDS.
pub type CdsSpec<'s> = (GeneKind, &'s [&'s str]);

/// (gene kind, (accession, aligned string) domains) of one CDS.
pub type AlignedCdsSpec<'s> = (GeneKind, &'s [(&'s str, &'s str)]);

/// Incrementally builds a dataset for tests. Each GBK gets distinct db ids;
/// records are laid out back-to-back on their GBK's coordinate axis.
pub struct DatasetBuilder {
    dataset       : Dataset,
    next_record_id: i64,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self { dataset: Dataset::new(), next_record_id: 1 }
    }

    pub fn gbk(&mut self, name: &str, source_type: SourceType) -> usize {
        let db_id = self.dataset.gbks().len() as i64 + 1;
        self.dataset.add_gbk(Gbk::new(db_id, format!("/data/{name}.gbk"), source_type))
    }

    fn push_cds(&mut self, gbk_idx: usize, specs: &[(GeneKind, Vec<(String, Option<String>)>)]) -> std::ops::Range<usize> {
        let genes = &mut self.dataset.gbks_mut()[gbk_idx].genes;
        let start = genes.len();
        for (kind, hsps) in specs {
            let offset = genes.len() * 1000;
            let mut cds = Cds::new(offset, offset + 900, Strand::Forward, *kind);
            for (accession, alignment) in hsps {
                let mut hsp = bgc::Hsp::new(accession.clone(), 100.0, 0, 50);
                if let Some(align_string) = alignment {
                    hsp = hsp.with_alignment(align_string.clone());
                }
                cds.hsps.push(hsp);
            }
            genes.push(cds);
        }
        start..genes.len()
    }

    fn add_record(&mut self, gbk_idx: usize, product: &str, kind: RecordKind, cds_range: std::ops::Range<usize>) -> usize {
        let db_id = self.next_record_id;
        self.next_record_id += 1;
        let genes = &self.dataset.gbks()[gbk_idx].genes;
        let nt_start = genes.get(cds_range.start).map_or(0, |cds| cds.nt_start);
        let nt_stop  = cds_range.end.checked_sub(1).and_then(|i| genes.get(i)).map_or(0, |cds| cds.nt_stop);
        self.dataset
            .add_record(Record {
                db_id: Some(db_id),
                parent_db_id: None,
                gbk_idx,
                nt_start,
                nt_stop,
                product: product.to_string(),
                kind,
                cds_range,
            })
            .expect("valid mock record")
    }

    pub fn region(&mut self, gbk_idx: usize, product: &str, cds: &[CdsSpec]) -> usize {
        let specs = plain_specs(cds);
        let cds_range = self.push_cds(gbk_idx, &specs);
        self.add_record(gbk_idx, product, RecordKind::Region, cds_range)
    }

    pub fn aligned_region(&mut self, gbk_idx: usize, product: &str, cds: &[AlignedCdsSpec]) -> usize {
        let specs = aligned_specs(cds);
        let cds_range = self.push_cds(gbk_idx, &specs);
        self.add_record(gbk_idx, product, RecordKind::Region, cds_range)
    }

    pub fn protocluster(
        &mut self,
        gbk_idx: usize,
        product: &str,
        category: Option<&str>,
        proto_core_cds_idx: &[usize],
        cds: &[CdsSpec],
    ) -> usize {
        let specs = plain_specs(cds);
        let cds_range = self.push_cds(gbk_idx, &specs);
        let kind = RecordKind::ProtoCluster {
            category          : category.map(String::from),
            proto_core_cds_idx: proto_core_cds_idx.iter().copied().collect::<AHashSet<usize>>(),
        };
        self.add_record(gbk_idx, product, kind, cds_range)
    }

    pub fn finish(self) -> Dataset {
        self.dataset
    }
}

fn plain_specs(cds: &[CdsSpec]) -> Vec<(GeneKind, Vec<(String, Option<String>)>)> {
    cds.iter()
        .map(|(kind, accessions)| {
            (*kind, accessions.iter().map(|acc| ((*acc).to_string(), None)).collect())
        })
        .collect()
}

fn aligned_specs(cds: &[AlignedCdsSpec]) -> Vec<(GeneKind, Vec<(String, Option<String>)>)> {
    cds.iter()
        .map(|(kind, hsps)| {
            (
                *kind,
                hsps.iter()
                    .map(|(acc, align)| ((*acc).to_string(), Some((*align).to_string())))
                    .collect(),
            )
        })
        .collect()
}

/// A finished mock dataset whose first two records form the pair under test.
pub struct MockArena {
    pub dataset: Dataset,
}

impl MockArena {
    pub fn pair(&self) -> RecordPair<'_> {
        RecordPair::new(self.dataset.view(0), self.dataset.view(1))
    }
}

/// One region on its own GBK.
pub fn record_with(cds: &[CdsSpec]) -> MockArena {
    let mut builder = DatasetBuilder::new();
    let gbk = builder.gbk("sample_a", SourceType::Query);
    builder.region(gbk, "other", cds);
    MockArena { dataset: builder.finish() }
}

/// Two regions on distinct GBKs.
pub fn pair_of(a: &[CdsSpec], b: &[CdsSpec]) -> MockArena {
    let mut builder = DatasetBuilder::new();
    let gbk_a = builder.gbk("sample_a", SourceType::Query);
    builder.region(gbk_a, "other", a);
    let gbk_b = builder.gbk("sample_b", SourceType::Query);
    builder.region(gbk_b, "other", b);
    MockArena { dataset: builder.finish() }
}

/// Two regions on distinct GBKs, with per-HSP aligned strings.
pub fn aligned_pair_of(a: &[AlignedCdsSpec], b: &[AlignedCdsSpec]) -> MockArena {
    let mut builder = DatasetBuilder::new();
    let gbk_a = builder.gbk("sample_a", SourceType::Query);
    builder.aligned_region(gbk_a, "other", a);
    let gbk_b = builder.gbk("sample_b", SourceType::Query);
    builder.aligned_region(gbk_b, "other", b);
    MockArena { dataset: builder.finish() }
}

/// Two protoclusters on distinct GBKs, with protocore CDS indices.
pub fn protocluster_pair(
    a: &[CdsSpec],
    a_core: &[usize],
    b: &[CdsSpec],
    b_core: &[usize],
) -> MockArena {
    let mut builder = DatasetBuilder::new();
    let gbk_a = builder.gbk("sample_a", SourceType::Query);
    builder.protocluster(gbk_a, "t1pks", Some("PKS"), a_core, a);
    let gbk_b = builder.gbk("sample_b", SourceType::Query);
    builder.protocluster(gbk_b, "t1pks", Some("PKS"), b_core, b);
    MockArena { dataset: builder.finish() }
}
