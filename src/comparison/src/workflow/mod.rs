use std::sync::mpsc;

use log::debug;

use bgc::Dataset;
use edge_store::{EdgeRow, Store};
use parser::AlignmentMode;

use crate::binning::{weights_or_mix, Bin, PairIds, Weights};
use crate::constants::MIN_LCS_LEN;
use crate::distances::{calc_ai_pair, calc_dss_pair, calc_jaccard_pair};
use crate::extend::extend;
use crate::lcs::{seed_pair, LcsSeed};
use crate::pair::RecordPair;
use crate::region::ComparableRegion;

mod error;
pub use error::WorkflowError;

/// Default number of pairs per worker batch, before the core-count clamp.
const DESIRED_BATCH_SIZE: usize = 10_000;

/// Everything a worker needs to score a batch. Fully copyable: workers
/// share no mutable state with the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    pub alignment_mode: AlignmentMode,
    pub edge_param_id : i64,
    pub weights       : Weights,
}

/// Copy an LCS seed into a pair's comparable region, on both axes.
pub fn apply_seed(region: &mut ComparableRegion, seed: LcsSeed) {
    region.lcs_domain_a_start = seed.domain_a_start;
    region.lcs_domain_a_stop  = seed.domain_a_stop;
    region.lcs_domain_b_start = seed.domain_b_start;
    region.lcs_domain_b_stop  = seed.domain_b_stop;
    region.lcs_a_start = seed.a_cds_start;
    region.lcs_a_stop  = seed.a_cds_stop;
    region.lcs_b_start = seed.b_cds_start;
    region.lcs_b_stop  = seed.b_cds_stop;
    region.domain_a_start = seed.domain_a_start;
    region.domain_a_stop  = seed.domain_a_stop;
    region.domain_b_start = seed.domain_b_start;
    region.domain_b_stop  = seed.domain_b_stop;
    region.a_start = seed.a_cds_start;
    region.a_stop  = seed.a_cds_stop;
    region.b_start = seed.b_cds_start;
    region.b_stop  = seed.b_cds_stop;
    region.reverse = seed.reverse;
}

/// Inflate the pair's window to full-CDS coordinates (see
/// [`ComparableRegion::inflate`]).
fn inflate_pair(pair: &mut RecordPair) {
    let RecordPair { a_domains, b_domains, b_domains_rev, comparable_region, .. } = pair;
    let b = if comparable_region.reverse { b_domains_rev } else { b_domains };
    comparable_region.inflate(a_domains, b);
}

/// Score one pair through the full pipeline: Jaccard gate, LCS seed,
/// mode-dependent extension with reset checks, the three sub-scores, and
/// window inflation.
pub fn score_pair(pair: &mut RecordPair, config: &ScoringConfig) -> Result<EdgeRow, WorkflowError> {
    let jaccard = calc_jaccard_pair(pair);
    if jaccard == 0.0 {
        inflate_pair(pair);
        return early_exit_row(pair, config);
    }

    let seed = seed_pair(pair)?;
    apply_seed(&mut pair.comparable_region, seed);

    let needs_extend = match config.alignment_mode {
        AlignmentMode::Global => false,
        AlignmentMode::Glocal => true,
        AlignmentMode::Local => {
            if pair.check(MIN_LCS_LEN, true) {
                true
            } else {
                debug!("resetting after lcs");
                pair.reset();
                false
            }
        }
    };

    if needs_extend {
        extend(pair);
        if !pair.check(0, true) {
            debug!("resetting after extend");
            pair.reset();
        }
        if calc_jaccard_pair(pair) == 0.0 {
            return early_exit_row(pair, config);
        }
    }

    let jaccard   = calc_jaccard_pair(pair);
    let adjacency = calc_ai_pair(pair);
    let dss       = calc_dss_pair(pair, config.weights.anchor_boost)?;

    let similarity = jaccard * config.weights.jaccard
        + adjacency * config.weights.adjacency
        + (1.0 - dss) * config.weights.dss;
    let distance = 1.0 - similarity;

    inflate_pair(pair);
    edge_row(pair, config, distance, jaccard, adjacency, dss)
}

fn early_exit_row(pair: &RecordPair, config: &ScoringConfig) -> Result<EdgeRow, WorkflowError> {
    edge_row(pair, config, 1.0, 0.0, 0.0, 0.0)
}

fn edge_row(
    pair: &RecordPair,
    config: &ScoringConfig,
    distance: f64,
    jaccard: f64,
    adjacency: f64,
    dss: f64,
) -> Result<EdgeRow, WorkflowError> {
    let record_a_id = pair.a.db_id().ok_or(WorkflowError::MissingRecordId)?;
    let record_b_id = pair.b.db_id().ok_or(WorkflowError::MissingRecordId)?;
    let region = &pair.comparable_region;

    Ok(EdgeRow {
        record_a_id,
        record_b_id,
        distance,
        jaccard,
        adjacency,
        dss,
        edge_param_id: config.edge_param_id,
        lcs_a_start  : region.lcs_a_start,
        lcs_a_stop   : region.lcs_a_stop,
        lcs_b_start  : region.lcs_b_start,
        lcs_b_stop   : region.lcs_b_stop,
        ext_a_start  : region.a_start,
        ext_a_stop   : region.a_stop,
        ext_b_start  : region.b_start,
        ext_b_stop   : region.b_stop,
        reverse      : region.reverse,
    })
}

/// Score a batch of pairs, preserving input order.
pub fn score_batch(
    dataset: &Dataset,
    batch: &[PairIds],
    config: &ScoringConfig,
) -> Result<Vec<EdgeRow>, WorkflowError> {
    let mut results = Vec::with_capacity(batch.len());
    for pair_ids in batch {
        let mut pair = RecordPair::new(dataset.view(pair_ids.idx_a), dataset.view(pair_ids.idx_b));
        results.push(score_pair(&mut pair, config)?);
    }
    Ok(results)
}

/// Batch size maximizing per-core pair counts while keeping batches
/// reasonable: the desired size, clamped to an even split over the cores,
/// degrading to one batch for tiny bins.
#[must_use]
pub fn get_batch_size(cores: usize, desired_batch_size: usize, num_items: usize) -> usize {
    if num_items < cores {
        return num_items.max(1);
    }
    if num_items < desired_batch_size {
        return num_items;
    }
    if cores * desired_batch_size > num_items {
        return (num_items + cores - 1) / cores;
    }
    desired_batch_size
}

fn next_batch(pairs: &mut impl Iterator<Item = PairIds>, batch_size: usize) -> Vec<PairIds> {
    pairs.by_ref().take(batch_size).collect()
}

type BatchResult = Result<Vec<EdgeRow>, WorkflowError>;

fn submit<'scope>(
    scope: &rayon::Scope<'scope>,
    dataset: &'scope Dataset,
    config: ScoringConfig,
    batch: Vec<PairIds>,
    sender: mpsc::Sender<BatchResult>,
) {
    scope.spawn(move |_| {
        let result = score_batch(dataset, &batch, &config);
        // a send failure means the coordinator already gave up on the bin.
        sender.send(result).ok();
    });
}

/// Score every missing pair of a bin and persist the edges.
///
/// One coordinator feeds up to `cores` in-flight batches to a scoped
/// thread pool; on each completion a replacement batch is submitted before
/// results are drained, and the batch's rows are written to the store in
/// one transaction. The first worker error aborts the bin: no further
/// batches are submitted and the error is surfaced after in-flight work
/// drains. `callback`, when given, receives the cumulative pair count
/// after each stored batch.
///
/// Returns the number of newly stored edges.
pub fn generate_edges(
    bin: &mut Bin,
    dataset: &Dataset,
    store: &mut Store,
    alignment_mode: AlignmentMode,
    cores: usize,
    batch_size: Option<usize>,
    legacy_sorting: bool,
    mut callback: Option<&mut (dyn FnMut(usize) + Send)>,
) -> Result<usize, WorkflowError> {
    let cores = if cores == 0 {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    } else {
        cores
    };

    let config = ScoringConfig {
        alignment_mode,
        edge_param_id: bin.edge_param_id,
        weights      : weights_or_mix(&bin.weights_label),
    };

    let (num_pairs, mut pairs) = bin.missing_pairs(dataset, store, legacy_sorting)?;
    if num_pairs == 0 {
        debug!("Bin '{}' has no missing pairs", bin.label);
        return Ok(0);
    }

    let batch_size = match batch_size {
        Some(requested) => requested.clamp(1, num_pairs),
        None => {
            let automatic = get_batch_size(cores, DESIRED_BATCH_SIZE, num_pairs);
            debug!("Using automatic batch size: {automatic}");
            automatic
        }
    };
    debug!("Using {cores} cores");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cores)
        .build()
        .map_err(WorkflowError::BuildThreadPool)?;

    let (sender, receiver) = mpsc::channel::<BatchResult>();

    pool.scope(move |scope| {
        // keeping the template sender in an Option lets us drop it as soon
        // as no further submission can happen, so a lost worker surfaces
        // as a disconnect instead of a hang.
        let mut sender_slot = Some(sender);
        let mut in_flight = 0_usize;
        let mut done_pairs = 0_usize;

        for _ in 0..cores {
            let batch = next_batch(&mut pairs, batch_size);
            if batch.is_empty() {
                sender_slot = None;
                break;
            }
            if let Some(sender) = sender_slot.as_ref() {
                submit(scope, dataset, config, batch, sender.clone());
                in_flight += 1;
            }
        }

        let mut failure: Option<WorkflowError> = None;
        while in_flight > 0 {
            let outcome = match receiver.recv() {
                Ok(outcome) => outcome,
                Err(_) => {
                    failure.get_or_insert(WorkflowError::WorkerLost);
                    break;
                }
            };
            in_flight -= 1;

            // replacement batch first, results second.
            if failure.is_none() {
                if let Some(sender) = sender_slot.as_ref() {
                    let batch = next_batch(&mut pairs, batch_size);
                    if batch.is_empty() {
                        sender_slot = None;
                    } else {
                        submit(scope, dataset, config, batch, sender.clone());
                        in_flight += 1;
                    }
                }
            }

            match outcome {
                Ok(rows) => {
                    if let Err(err) = store.insert_edges(&rows) {
                        failure.get_or_insert(err.into());
                        sender_slot = None;
                        continue;
                    }
                    done_pairs += rows.len();
                    if let Some(callback) = callback.as_mut() {
                        callback(done_pairs);
                    }
                }
                Err(err) => {
                    failure.get_or_insert(err);
                    sender_slot = None;
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None      => Ok(done_pairs),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::generate_mix;
    use crate::testutil::{aligned_pair_of, pair_of, DatasetBuilder, AlignedCdsSpec, BIO, OTHER};
    use bgc::SourceType;

    fn mix_config() -> ScoringConfig {
        ScoringConfig {
            alignment_mode: AlignmentMode::Local,
            edge_param_id : 1,
            weights       : weights_or_mix("mix"),
        }
    }

    #[test]
    fn batch_size_table() {
        // fewer pairs than cores: one pair per worker.
        assert_eq!(get_batch_size(4, 10_000, 2), 2);
        // fewer pairs than the desired size: a single batch.
        assert_eq!(get_batch_size(4, 10_000, 5_000), 5_000);
        // enough pairs to split evenly below the desired size.
        assert_eq!(get_batch_size(4, 10_000, 20_000), 5_000);
        // plenty of pairs: desired size wins.
        assert_eq!(get_batch_size(4, 10_000, 100_000), 10_000);
        // never zero.
        assert_eq!(get_batch_size(4, 10_000, 0), 1);
    }

    #[test]
    fn identical_records_score_distance_zero() {
        let identical: &[AlignedCdsSpec] = &[
            (OTHER, &[("PF1", "MAGIC")]),
            (OTHER, &[("PF2", "WORDS")]),
            (OTHER, &[("PF3", "HERE-")]),
        ];
        let arena = aligned_pair_of(identical, identical);
        let mut pair = arena.pair();
        let row = score_pair(&mut pair, &mix_config()).unwrap();

        assert!((row.jaccard - 1.0).abs() < 1e-9);
        assert!((row.adjacency - 1.0).abs() < 1e-9);
        assert!(row.dss.abs() < 1e-9);
        assert!(row.distance.abs() < 1e-9);
        assert!(!row.reverse);
        // no biosynthetic CDS anywhere: the window resets to (and inflates
        // to) the full range.
        assert_eq!((row.ext_a_start, row.ext_a_stop), (0, 3));
        assert_eq!((row.ext_b_start, row.ext_b_stop), (0, 3));
    }

    #[test]
    fn disjoint_records_early_exit() {
        let arena = pair_of(
            &[(OTHER, &["PF1"]), (OTHER, &["PF2"]), (OTHER, &["PF3"])],
            &[(OTHER, &["PF4"]), (OTHER, &["PF5"]), (OTHER, &["PF6"])],
        );
        let mut pair = arena.pair();
        let row = score_pair(&mut pair, &mix_config()).unwrap();

        assert_eq!(row.distance, 1.0);
        assert_eq!(row.jaccard, 0.0);
        assert_eq!(row.adjacency, 0.0);
        assert_eq!(row.dss, 0.0);
        assert!(!row.reverse);
        assert_eq!((row.ext_a_start, row.ext_a_stop), (0, 3));
    }

    #[test]
    fn composite_distance_matches_weight_formula() {
        let arena = aligned_pair_of(
            &[(BIO, &[("PF1", "AABB")]), (OTHER, &[("PF2", "CCCC")]), (OTHER, &[("PF3", "DDDD")])],
            &[(BIO, &[("PF1", "AACC")]), (OTHER, &[("PF2", "CCCC")]), (OTHER, &[("PF4", "EEEE")])],
        );
        let mut pair = arena.pair();
        let config = mix_config();
        let row = score_pair(&mut pair, &config).unwrap();

        let similarity = row.jaccard * config.weights.jaccard
            + row.adjacency * config.weights.adjacency
            + (1.0 - row.dss) * config.weights.dss;
        assert!((row.distance - (1.0 - similarity)).abs() < 1e-9);
        assert!(row.distance > 0.0 && row.distance < 1.0);
    }

    #[test]
    fn metrics_are_symmetric() {
        let a: &[AlignedCdsSpec] = &[
            (BIO, &[("PF1", "AABB")]),
            (OTHER, &[("PF2", "CCCC")]),
            (OTHER, &[("PF3", "DDDD")]),
        ];
        let b: &[AlignedCdsSpec] = &[
            (BIO, &[("PF1", "AACC")]),
            (OTHER, &[("PF2", "CCCC")]),
            (OTHER, &[("PF5", "FFFF")]),
        ];
        let forward = aligned_pair_of(a, b);
        let swapped = aligned_pair_of(b, a);
        let config = mix_config();

        let mut pair = forward.pair();
        let row_ab = score_pair(&mut pair, &config).unwrap();
        let mut pair = swapped.pair();
        let row_ba = score_pair(&mut pair, &config).unwrap();

        assert!((row_ab.jaccard - row_ba.jaccard).abs() < 1e-9);
        assert!((row_ab.adjacency - row_ba.adjacency).abs() < 1e-9);
        assert!((row_ab.dss - row_ba.dss).abs() < 1e-9);
        assert!((row_ab.distance - row_ba.distance).abs() < 1e-9);
    }

    #[test]
    fn global_mode_scores_the_seed_window() {
        let arena = pair_of(
            &[(OTHER, &["PF1"]), (OTHER, &["PF2"]), (OTHER, &["PF9"])],
            &[(OTHER, &["PF1"]), (OTHER, &["PF2"]), (OTHER, &["PF8"])],
        );
        let mut pair = arena.pair();
        let config = ScoringConfig { alignment_mode: AlignmentMode::Global, ..mix_config() };
        let row = score_pair(&mut pair, &config).unwrap();

        // the [PF1, PF2] seed is scored as-is: perfect Jaccard within it.
        assert!((row.jaccard - 1.0).abs() < 1e-9);
        assert_eq!((row.ext_a_start, row.ext_a_stop), (0, 2));
        assert_eq!((row.lcs_a_start, row.lcs_a_stop), (0, 2));
    }

    fn worker_dataset(n_records: usize) -> bgc::Dataset {
        let mut builder = DatasetBuilder::new();
        for i in 0..n_records {
            let gbk = builder.gbk(&format!("sample_{i:02}"), SourceType::Query);
            builder.region(gbk, "other", &[(OTHER, &["PF1"]), (OTHER, &["PF2"]), (BIO, &["PF3"])]);
        }
        builder.finish()
    }

    #[test]
    fn generate_edges_stores_every_missing_pair() {
        let dataset = worker_dataset(5);
        let mut store = Store::open_in_memory().unwrap();
        let record_idx: Vec<usize> = (0..5).collect();
        let mut bin = generate_mix(&dataset, &record_idx, &store, AlignmentMode::Local).unwrap();

        let mut seen = Vec::new();
        let stored = generate_edges(
            &mut bin,
            &dataset,
            &mut store,
            AlignmentMode::Local,
            2,
            Some(3),
            false,
            Some(&mut |done| seen.push(done)),
        )
        .unwrap();

        assert_eq!(stored, 10); // C(5,2)
        assert_eq!(store.edge_count().unwrap(), 10);
        assert_eq!(seen.last().copied(), Some(10));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));

        // a second run finds nothing left to do.
        let mut bin = generate_mix(&dataset, &record_idx, &store, AlignmentMode::Local).unwrap();
        let stored = generate_edges(
            &mut bin, &dataset, &mut store, AlignmentMode::Local, 2, None, false, None,
        )
        .unwrap();
        assert_eq!(stored, 0);
    }

    #[test]
    fn worker_error_aborts_the_bin() {
        // same accession, different alignment lengths: the DSS contract
        // violation must surface as an error, not a panic.
        let mut builder = DatasetBuilder::new();
        let gbk_a = builder.gbk("a", SourceType::Query);
        builder.aligned_region(gbk_a, "other", &[(OTHER, &[("PF1", "AAA")])]);
        let gbk_b = builder.gbk("b", SourceType::Query);
        builder.aligned_region(gbk_b, "other", &[(OTHER, &[("PF1", "AAAAA")])]);
        let dataset = builder.finish();

        let mut store = Store::open_in_memory().unwrap();
        let mut bin = generate_mix(&dataset, &[0, 1], &store, AlignmentMode::Local).unwrap();
        let result = generate_edges(
            &mut bin, &dataset, &mut store, AlignmentMode::Local, 1, None, false, None,
        );
        assert!(matches!(result, Err(WorkflowError::Distance(_))));
    }
}
