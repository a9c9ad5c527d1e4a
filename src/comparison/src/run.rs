//! Top-level run orchestration: bin construction, edge generation and
//! progress reporting for the `cluster` and `query` commands.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use bgc::Dataset;
use edge_store::Store;
use parser::{ClassifyMode, Cluster, Common, Query, RecordType};

use crate::binning::{self, Bin, ClassKey};
use crate::workflow::generate_edges;

/// Run the all-vs-all comparison workflow over the dataset in the store.
pub fn cluster(common: &Common, cluster: &Cluster) -> Result<()> {
    let mut store = Store::open(&common.db)
        .with_context(|| format!("While opening the run database {}", common.db.display()))?;
    let dataset = store.load_dataset().context("While hydrating the record dataset")?;
    let record_idx = comparable_records(&dataset, common.record_type);

    let bins = match cluster.classify {
        ClassifyMode::Mix => {
            vec![binning::generate_mix(&dataset, &record_idx, &store, common.alignment_mode)?]
        }
        ClassifyMode::Class => binning::class_bins(
            &dataset,
            &record_idx,
            ClassKey::Product,
            common.weight_mode,
            cluster.hybrids_off,
            &store,
            common.alignment_mode,
        )?,
        ClassifyMode::Category => binning::class_bins(
            &dataset,
            &record_idx,
            ClassKey::Category,
            common.weight_mode,
            cluster.hybrids_off,
            &store,
            common.alignment_mode,
        )?,
        ClassifyMode::Legacy => {
            binning::legacy_bins(&dataset, &record_idx, &store, common.alignment_mode)?
        }
    };

    for mut bin in bins {
        if bin.len() < 2 {
            info!("Skipping bin '{}': fewer than two records", bin.label);
            continue;
        }
        // a failed bin does not sink the run; its pairs stay missing and a
        // re-run will pick them up.
        match run_bin(&mut bin, &dataset, &mut store, common) {
            Ok(stored) => info!("Bin '{}': {stored} new edges", bin.label),
            Err(err)   => error!("Bin '{}' failed: {err:?}", bin.label),
        }
    }
    Ok(())
}

/// Run the query workflow: query records against the reference set, then
/// repeated reference-propagation rounds until the network stops growing.
pub fn query(common: &Common, query: &Query) -> Result<()> {
    let mut store = Store::open(&common.db)
        .with_context(|| format!("While opening the run database {}", common.db.display()))?;
    let dataset = store.load_dataset().context("While hydrating the record dataset")?;
    let record_idx = comparable_records(&dataset, common.record_type);

    let mut query_bin = binning::query_bin(&dataset, &record_idx, &store, common.alignment_mode)?;
    if query_bin.len() < 2 {
        warn!("Fewer than two records to compare. Nothing to do.");
        return Ok(());
    }
    let stored = run_bin(&mut query_bin, &dataset, &mut store, common)
        .context("While generating query edges")?;
    info!("Query round: {stored} new edges");

    // propagate through the reference set: every round compares newly
    // connected references against the remaining singletons, until a round
    // finds nothing new. The bin's done set guarantees termination.
    let mut ref_bin =
        binning::ref_singleton_bin(&dataset, &record_idx, &store, common.alignment_mode)?;
    let mut round = 0_usize;
    loop {
        round += 1;
        if let Some(max_rounds) = query.max_rounds {
            if round > max_rounds {
                info!("Stopping propagation after {max_rounds} rounds");
                break;
            }
        }
        let stored = run_bin(&mut ref_bin, &dataset, &mut store, common)
            .with_context(|| format!("While propagating reference edges (round {round})"))?;
        if stored == 0 {
            break;
        }
        info!("Propagation round {round}: {stored} new edges");
    }
    Ok(())
}

/// Indices of the records entering comparison bins: records of the
/// requested granularity carrying a persistent id.
fn comparable_records(dataset: &Dataset, record_type: RecordType) -> Vec<usize> {
    let wanted = match record_type {
        RecordType::Region       => "region",
        RecordType::ProtoCluster => "proto_cluster",
        RecordType::ProtoCore    => "proto_core",
    };
    (0..dataset.records().len())
        .filter(|&idx| {
            let record = dataset.record(idx);
            record.db_id.is_some() && record.kind_label() == wanted
        })
        .collect()
}

fn run_bin(bin: &mut Bin, dataset: &Dataset, store: &mut Store, common: &Common) -> Result<usize> {
    let num_pairs = bin.num_pairs(dataset, store)?;
    info!("{bin}: {num_pairs} pairs to score");

    let progress = ProgressBar::new(num_pairs as u64).with_style(
        ProgressStyle::with_template("{msg:<12} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let progress = logger::Logger::multi().add(progress);
    progress.set_message(bin.label.clone());

    let mut on_batch = |done: usize| progress.set_position(done as u64);
    let stored = generate_edges(
        bin,
        dataset,
        store,
        common.alignment_mode,
        common.threads,
        common.batch_size,
        common.legacy_sort,
        Some(&mut on_batch),
    )?;
    progress.finish_and_clear();
    Ok(stored)
}
