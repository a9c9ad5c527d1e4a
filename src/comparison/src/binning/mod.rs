use ahash::{AHashMap, AHashSet};
use log::warn;

use bgc::{Dataset, RecordKind};
use edge_store::Store;
use parser::{AlignmentMode, WeightMode};

mod legacy;
pub use legacy::{legacy_get_class, LEGACY_CLASSES};

mod stream;
pub use stream::{MissingPairs, PairIds, PairStream};
use stream::PairItem;

mod error;
pub use error::BinningError;

/// Per-bin scoring weights: the JC/AI/DSS mixture and the anchor boost
/// applied inside DSS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub jaccard     : f64,
    pub adjacency   : f64,
    pub dss         : f64,
    pub anchor_boost: f64,
}

const MIX_WEIGHTS: Weights =
    Weights { jaccard: 0.2, adjacency: 0.05, dss: 0.75, anchor_boost: 2.0 };

/// The legacy weight profile of a class label, if one is defined.
#[must_use]
pub fn legacy_weights(label: &str) -> Option<Weights> {
    let (jaccard, adjacency, dss, anchor_boost) = match label {
        "PKSI"            => (0.22, 0.02, 0.76, 1.0),
        "PKSother"        => (0.0, 0.68, 0.32, 4.0),
        "NRPS"            => (0.0, 0.0, 1.0, 4.0),
        "RiPP"            => (0.28, 0.01, 0.71, 1.0),
        "saccharide"      => (0.0, 1.0, 0.0, 1.0),
        "terpene"         => (0.2, 0.05, 0.75, 2.0),
        "PKS-NRP_Hybrids" => (0.0, 0.22, 0.78, 1.0),
        "other"           => (0.01, 0.02, 0.97, 4.0),
        "mix"             => (0.2, 0.05, 0.75, 2.0),
        _ => return None,
    };
    Some(Weights { jaccard, adjacency, dss, anchor_boost })
}

/// Resolve a weight label, falling back to the mix profile with a warning
/// for unknown labels.
#[must_use]
pub fn weights_or_mix(label: &str) -> Weights {
    legacy_weights(label).unwrap_or_else(|| {
        warn!("Unknown weight label '{label}'. Falling back to the mix profile");
        MIX_WEIGHTS
    })
}

/// Pair-enumeration policy of a bin.
#[derive(Debug)]
pub enum PairSource {
    /// Every record against every other.
    AllVsAll,
    /// Query records against references and later queries; never ref↔ref.
    QueryToRef,
    /// Store-connected references against store-singleton references. The
    /// done set accumulates across generation rounds so no connected record
    /// is re-yielded.
    RefToSingleton { done_record_ids: AHashSet<i64> },
    /// Replay of previously stored edges, in edge order.
    ConnectedComponent { edges: Vec<(i64, i64)> },
}

/// A labeled group of records sharing a weight profile and an edge
/// parameter id, with a pair-enumeration policy.
#[derive(Debug)]
pub struct Bin {
    pub label        : String,
    pub weights_label: String,
    pub edge_param_id: i64,
    record_idx       : Vec<usize>,
    record_ids       : AHashSet<i64>,
    source           : PairSource,
}

impl Bin {
    #[must_use]
    pub fn new(label: impl Into<String>, weights_label: impl Into<String>, edge_param_id: i64, source: PairSource) -> Self {
        Self {
            label        : label.into(),
            weights_label: weights_label.into(),
            edge_param_id,
            record_idx   : Vec::new(),
            record_ids   : AHashSet::new(),
            source,
        }
    }

    /// Add records to this bin by dataset index.
    ///
    /// # Errors
    /// - if any record lacks a persistent id; every binned record must be
    ///   represented in the store.
    pub fn add_records(&mut self, dataset: &Dataset, indices: &[usize]) -> Result<(), BinningError> {
        for &record_idx in indices {
            let db_id = dataset.record(record_idx).db_id.ok_or_else(|| {
                BinningError::RecordMissingId { label: self.label.clone(), record_idx }
            })?;
            self.record_idx.push(record_idx);
            self.record_ids.insert(db_id);
        }
        Ok(())
    }

    #[must_use]
    pub fn records(&self) -> &[usize] {
        &self.record_idx
    }

    #[must_use]
    pub fn record_ids(&self) -> &AHashSet<i64> {
        &self.record_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.record_idx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_idx.is_empty()
    }

    /// The number of pairs the next `generate_pairs` call will yield.
    pub fn num_pairs(&self, dataset: &Dataset, store: &Store) -> Result<usize, BinningError> {
        match &self.source {
            PairSource::AllVsAll => {
                let n = self.record_idx.len();
                if n < 2 {
                    return Ok(0);
                }
                Ok(n * (n - 1) / 2 - same_gbk_pairs(dataset, &self.record_idx))
            }
            PairSource::QueryToRef => {
                let (queries, refs) = partition_queries(dataset, &self.record_idx);
                let query_to_ref = queries.len() * refs.len();
                let query_to_query = queries.len() * queries.len().saturating_sub(1) / 2
                    - same_gbk_pairs(dataset, &queries);
                Ok(query_to_ref + query_to_query)
            }
            PairSource::RefToSingleton { done_record_ids } => {
                let reference_ids = reference_ids_of(dataset, &self.record_idx);
                let connected =
                    store.connected_reference_ids(self.edge_param_id, &reference_ids, done_record_ids)?;
                let singletons = store.singleton_reference_ids(self.edge_param_id, &reference_ids)?;
                Ok(connected.len() * singletons.len()
                    - same_gbk_cross_pairs(dataset, &self.record_idx, &connected, &singletons))
            }
            PairSource::ConnectedComponent { edges } => Ok(edges.len()),
        }
    }

    /// Enumerate this bin's pairs. For the ref-to-singleton policy, the
    /// connected set is appended to the done set, so a subsequent call
    /// yields only newly connected records.
    pub fn generate_pairs(
        &mut self,
        dataset: &Dataset,
        store: &Store,
        legacy_sorting: bool,
    ) -> Result<PairStream, BinningError> {
        let edge_param_id = self.edge_param_id;
        match &mut self.source {
            PairSource::AllVsAll => {
                Ok(PairStream::all_vs_all(pair_items(dataset, &self.record_idx), legacy_sorting))
            }
            PairSource::QueryToRef => {
                let (queries, refs) = partition_queries(dataset, &self.record_idx);
                Ok(PairStream::query_to_ref(
                    pair_items(dataset, &queries),
                    pair_items(dataset, &refs),
                    legacy_sorting,
                ))
            }
            PairSource::RefToSingleton { done_record_ids } => {
                let reference_ids = reference_ids_of(dataset, &self.record_idx);
                let connected =
                    store.connected_reference_ids(edge_param_id, &reference_ids, done_record_ids)?;
                let singletons = store.singleton_reference_ids(edge_param_id, &reference_ids)?;
                done_record_ids.extend(connected.iter().copied());

                let idx_of_id = idx_by_id(dataset, &self.record_idx);
                let left: Vec<usize> =
                    connected.iter().filter_map(|db_id| idx_of_id.get(db_id).copied()).collect();
                let right: Vec<usize> =
                    singletons.iter().filter_map(|db_id| idx_of_id.get(db_id).copied()).collect();
                Ok(PairStream::product(
                    pair_items(dataset, &left),
                    pair_items(dataset, &right),
                    legacy_sorting,
                ))
            }
            PairSource::ConnectedComponent { edges } => {
                let idx_of_id = idx_by_id(dataset, &self.record_idx);
                let mut pairs = Vec::with_capacity(edges.len());
                for &(id_a, id_b) in edges.iter() {
                    let (Some(&idx_a), Some(&idx_b)) = (idx_of_id.get(&id_a), idx_of_id.get(&id_b))
                    else {
                        warn!("Edge ({id_a}, {id_b}) references records outside bin '{}'", self.label);
                        continue;
                    };
                    pairs.push((pair_item(dataset, idx_a), pair_item(dataset, idx_b)));
                }
                Ok(PairStream::replay(pairs, legacy_sorting))
            }
        }
    }

    /// Expected count and stream of the pairs not yet stored under this
    /// bin's edge parameter id, in either orientation.
    pub fn missing_pairs(
        &mut self,
        dataset: &Dataset,
        store: &Store,
        legacy_sorting: bool,
    ) -> Result<(usize, MissingPairs), BinningError> {
        let expected = self.num_pairs(dataset, store)?;
        let existing = store.existing_pairs(self.edge_param_id, &self.record_ids)?;
        let count = expected.saturating_sub(existing.len());
        let stream = self.generate_pairs(dataset, store, legacy_sorting)?;
        Ok((count, MissingPairs::new(stream, existing)))
    }
}

fn pair_item(dataset: &Dataset, record_idx: usize) -> PairItem {
    let view = dataset.view(record_idx);
    PairItem {
        idx     : record_idx,
        db_id   : view.db_id().unwrap_or(-1),
        gbk_idx : view.record.gbk_idx,
        sort_key: view.gbk.file_stem().to_string(),
    }
}

fn pair_items(dataset: &Dataset, indices: &[usize]) -> Vec<PairItem> {
    indices.iter().map(|&record_idx| pair_item(dataset, record_idx)).collect()
}

/// Split record indices into (query, reference) sets by GBK source type.
fn partition_queries(dataset: &Dataset, record_idx: &[usize]) -> (Vec<usize>, Vec<usize>) {
    record_idx
        .iter()
        .copied()
        .partition(|&record_idx| dataset.view(record_idx).is_query())
}

fn reference_ids_of(dataset: &Dataset, record_idx: &[usize]) -> AHashSet<i64> {
    record_idx
        .iter()
        .filter(|&&record_idx| !dataset.view(record_idx).is_query())
        .filter_map(|&record_idx| dataset.record(record_idx).db_id)
        .collect()
}

fn idx_by_id(dataset: &Dataset, record_idx: &[usize]) -> AHashMap<i64, usize> {
    record_idx
        .iter()
        .filter_map(|&record_idx| dataset.record(record_idx).db_id.map(|db_id| (db_id, record_idx)))
        .collect()
}

/// Pairs of `indices` sharing a parent GBK: C(k, 2) per GBK group.
fn same_gbk_pairs(dataset: &Dataset, indices: &[usize]) -> usize {
    let mut per_gbk: AHashMap<usize, usize> = AHashMap::new();
    for &record_idx in indices {
        *per_gbk.entry(dataset.record(record_idx).gbk_idx).or_insert(0) += 1;
    }
    per_gbk.values().map(|&count| count * (count - 1) / 2).sum()
}

/// Cross pairs between two id sets sharing a parent GBK.
fn same_gbk_cross_pairs(
    dataset: &Dataset,
    record_idx: &[usize],
    left_ids: &[i64],
    right_ids: &[i64],
) -> usize {
    let gbk_of_id: AHashMap<i64, usize> = record_idx
        .iter()
        .filter_map(|&record_idx| {
            let record = dataset.record(record_idx);
            record.db_id.map(|db_id| (db_id, record.gbk_idx))
        })
        .collect();

    let mut left_per_gbk: AHashMap<usize, usize> = AHashMap::new();
    for db_id in left_ids {
        if let Some(&gbk_idx) = gbk_of_id.get(db_id) {
            *left_per_gbk.entry(gbk_idx).or_insert(0) += 1;
        }
    }
    right_ids
        .iter()
        .filter_map(|db_id| gbk_of_id.get(db_id))
        .filter_map(|gbk_idx| left_per_gbk.get(gbk_idx))
        .copied()
        .sum()
}

impl std::fmt::Display for Bin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bin '{}': {} BGC records", self.label, self.record_idx.len())
    }
}

// ---------------------------------------------------------------- builders

/// A single all-vs-all bin over every supplied record.
pub fn generate_mix(
    dataset: &Dataset,
    record_idx: &[usize],
    store: &Store,
    mode: AlignmentMode,
) -> Result<Bin, BinningError> {
    let edge_param_id = store.resolve_edge_param("mix", &mode.to_string())?;
    let mut bin = Bin::new("mix", "mix", edge_param_id, PairSource::AllVsAll);
    bin.add_records(dataset, record_idx)?;
    Ok(bin)
}

/// How class bins group records: by product annotation or by antiSMASH
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKey {
    Product,
    Category,
}

/// One all-vs-all bin per class label. With `hybrids_off`, a hybrid product
/// ("a.b") lands in both base bins instead of a dedicated hybrid bin.
pub fn class_bins(
    dataset: &Dataset,
    record_idx: &[usize],
    class_key: ClassKey,
    weight_mode: WeightMode,
    hybrids_off: bool,
    store: &Store,
    mode: AlignmentMode,
) -> Result<Vec<Bin>, BinningError> {
    let mut class_order: Vec<String> = Vec::new();
    let mut class_records: AHashMap<String, Vec<usize>> = AHashMap::new();
    let mut class_weights: AHashMap<String, String> = AHashMap::new();

    for &idx in record_idx {
        let record = dataset.record(idx);
        let labels: Vec<String> = match class_key {
            ClassKey::Product => {
                if hybrids_off {
                    record.product.split('.').map(String::from).collect()
                } else {
                    vec![record.product.clone()]
                }
            }
            ClassKey::Category => vec![get_record_category(dataset, idx)],
        };

        for label in labels {
            if !class_records.contains_key(&label) {
                class_order.push(label.clone());
            }
            class_records.entry(label.clone()).or_default().push(idx);

            match weight_mode {
                WeightMode::Legacy => {
                    class_weights
                        .entry(label)
                        .or_insert_with(|| get_weight_category(dataset, idx));
                }
                WeightMode::Mix => {
                    class_weights.entry(label).or_insert_with(|| "mix".to_string());
                }
            }
        }
    }

    let mut bins = Vec::with_capacity(class_order.len());
    for label in class_order {
        let weights_label = class_weights[&label].clone();
        let edge_param_id = store.resolve_edge_param(&weights_label, &mode.to_string())?;
        let mut bin = Bin::new(label.clone(), weights_label, edge_param_id, PairSource::AllVsAll);
        bin.add_records(dataset, &class_records[&label])?;
        bins.push(bin);
    }
    Ok(bins)
}

/// The eight fixed class bins of the first-generation workflow. Every class
/// bin is returned, populated or not; empty bins are soft-skipped
/// downstream.
pub fn legacy_bins(
    dataset: &Dataset,
    record_idx: &[usize],
    store: &Store,
    mode: AlignmentMode,
) -> Result<Vec<Bin>, BinningError> {
    let mut class_records: AHashMap<&str, Vec<usize>> = AHashMap::new();
    for &idx in record_idx {
        // product hybrids of older annotation runs use '-' separators.
        let product = dataset.record(idx).product.replace('-', ".");
        let class = legacy_get_class(&product);
        class_records.entry(class).or_default().push(idx);
    }

    let mut bins = Vec::with_capacity(LEGACY_CLASSES.len());
    for class in LEGACY_CLASSES {
        let edge_param_id = store.resolve_edge_param(class, &mode.to_string())?;
        let mut bin = Bin::new(class, class, edge_param_id, PairSource::AllVsAll);
        if let Some(indices) = class_records.get(class) {
            bin.add_records(dataset, indices)?;
        }
        bins.push(bin);
    }
    Ok(bins)
}

/// The query↔reference bin of a query run.
pub fn query_bin(
    dataset: &Dataset,
    record_idx: &[usize],
    store: &Store,
    mode: AlignmentMode,
) -> Result<Bin, BinningError> {
    let edge_param_id = store.resolve_edge_param("mix", &mode.to_string())?;
    let mut bin = Bin::new("query", "mix", edge_param_id, PairSource::QueryToRef);
    bin.add_records(dataset, record_idx)?;
    Ok(bin)
}

/// The reference-propagation bin of a query run. Its done set persists
/// across generation rounds.
pub fn ref_singleton_bin(
    dataset: &Dataset,
    record_idx: &[usize],
    store: &Store,
    mode: AlignmentMode,
) -> Result<Bin, BinningError> {
    let edge_param_id = store.resolve_edge_param("mix", &mode.to_string())?;
    let mut bin = Bin::new(
        "query_ref",
        "mix",
        edge_param_id,
        PairSource::RefToSingleton { done_record_ids: AHashSet::new() },
    );
    bin.add_records(dataset, record_idx)?;
    Ok(bin)
}

/// A bin replaying the stored edges of one connected component. Only
/// records appearing in the component's edges are kept.
pub fn component_bin(
    dataset: &Dataset,
    record_idx: &[usize],
    edges: Vec<(i64, i64)>,
    label: impl Into<String>,
    weights_label: impl Into<String>,
    store: &Store,
    mode: AlignmentMode,
) -> Result<Bin, BinningError> {
    let weights_label = weights_label.into();
    let edge_param_id = store.resolve_edge_param(&weights_label, &mode.to_string())?;

    let component_ids: AHashSet<i64> = edges.iter().flat_map(|&(id_a, id_b)| [id_a, id_b]).collect();
    let members: Vec<usize> = record_idx
        .iter()
        .copied()
        .filter(|&idx| {
            dataset.record(idx).db_id.is_some_and(|db_id| component_ids.contains(&db_id))
        })
        .collect();

    let mut bin = Bin::new(label, weights_label, edge_param_id, PairSource::ConnectedComponent { edges });
    bin.add_records(dataset, &members)?;
    Ok(bin)
}

// ---------------------------------------------------------- classification

/// The antiSMASH category of a record. Protoclusters and protocores carry
/// their own; regions aggregate the unique categories of their child
/// protoclusters, joined by '.'.
#[must_use]
pub fn get_record_category(dataset: &Dataset, record_idx: usize) -> String {
    let record = dataset.record(record_idx);
    let mut categories: Vec<&str> = Vec::new();

    match &record.kind {
        RecordKind::ProtoCluster { .. } | RecordKind::ProtoCore { .. } => {
            if let Some(category) = record.category() {
                categories.push(category);
            }
        }
        RecordKind::Region => {
            for child in dataset.records() {
                if child.parent_db_id != record.db_id || !child.is_proto_cluster() {
                    continue;
                }
                if let Some(category) = child.category() {
                    // hybrids of the same kind count as one category.
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
            }
        }
    }

    if categories.is_empty() {
        return "Categoryless".to_string();
    }
    categories.join(".")
}

/// The legacy weight class of a record, from its categories. T1PKS is the
/// one product whose category does not map onto a legacy class, so the
/// product wins there.
///
/// Multi-category records all resolve to "PKSother": this ports the
/// observable behaviour of the original classifier, whose hybrid branches
/// were unreachable.
#[must_use]
pub fn get_weight_category(dataset: &Dataset, record_idx: usize) -> String {
    let record = dataset.record(record_idx);
    let mut categories: Vec<&str> = Vec::new();

    match &record.kind {
        RecordKind::ProtoCluster { .. } | RecordKind::ProtoCore { .. } => {
            if record.category().is_some() {
                if record.product == "T1PKS" {
                    categories.push(&record.product);
                } else if let Some(category) = record.category() {
                    categories.push(category);
                }
            }
        }
        RecordKind::Region => {
            for child in dataset.records() {
                if child.parent_db_id != record.db_id || !child.is_proto_cluster() {
                    continue;
                }
                if child.category().is_none() {
                    continue;
                }
                let category = if child.product == "T1PKS" {
                    child.product.as_str()
                } else {
                    child.category().unwrap_or_default()
                };
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
    }

    match categories.len() {
        0 => {
            warn!(
                "No category found for record {:?}. This should not happen for \
                 records annotated with antiSMASH 6 or up",
                record.db_id
            );
            "other".to_string()
        }
        1 => categories[0].to_string(),
        _ => "PKSother".to_string(),
    }
}
