use std::ops::Range;

use ahash::AHashSet;

/// Granularity of a BGC record.
///
/// A `Region` spans a full cluster; a `ProtoCluster` is a sub-region with an
/// annotation category and a set of core biosynthetic CDS; a `ProtoCore` is
/// the biosynthetic heart of a protocluster.
#[derive(Debug)]
pub enum RecordKind {
    Region,
    ProtoCluster {
        category          : Option<String>,
        /// Indices into this record's CDS slice marking core biosynthetic
        /// genes.
        proto_core_cds_idx: AHashSet<usize>,
    },
    ProtoCore {
        category: Option<String>,
    },
}

/// A single comparable BGC record.
/// # Fields
/// - `db_id`    : persistent id within the store. Required before a record
///                may enter a bin.
/// - `parent_db_id`: persistent id of the enclosing record, when nested
///                (protocluster within a region, protocore within a
///                protocluster).
/// - `gbk_idx`  : arena index of the parent GBK within the dataset.
/// - `nt_start`/`nt_stop`: nucleotide range of the record on its GBK.
/// - `product`  : product annotation label (e.g. "T1PKS", "nrps.t1pks").
/// - `kind`     : record granularity and kind-specific payload.
/// - `cds_range`: index range into the parent GBK's CDS list.
#[derive(Debug)]
pub struct Record {
    pub db_id       : Option<i64>,
    pub parent_db_id: Option<i64>,
    pub gbk_idx     : usize,
    pub nt_start    : usize,
    pub nt_stop     : usize,
    pub product     : String,
    pub kind        : RecordKind,
    pub cds_range   : Range<usize>,
}

impl Record {
    /// The annotation category carried by protoclusters and protocores.
    /// Regions aggregate their protocluster categories at binning time and
    /// carry none themselves.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Region => None,
            RecordKind::ProtoCluster { category, .. } | RecordKind::ProtoCore { category } => {
                category.as_deref()
            }
        }
    }

    #[must_use]
    pub fn is_proto_cluster(&self) -> bool {
        matches!(self.kind, RecordKind::ProtoCluster { .. })
    }

    /// Core biosynthetic CDS indices, for protoclusters.
    #[must_use]
    pub fn proto_core_cds_idx(&self) -> Option<&AHashSet<usize>> {
        match &self.kind {
            RecordKind::ProtoCluster { proto_core_cds_idx, .. } => Some(proto_core_cds_idx),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            RecordKind::Region           => "region",
            RecordKind::ProtoCluster { .. } => "proto_cluster",
            RecordKind::ProtoCore { .. }    => "proto_core",
        }
    }
}
