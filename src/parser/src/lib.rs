use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgEnum, Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="domdist", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// DOMDIST-rs: domain-based distance estimation for biosynthetic gene clusters
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Warnings are emitted even when this flag is off. Use --quiet/-q to
    /// disable them.
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file, at the root
    /// of the user-provided `--output-dir` folder, so a run can be
    /// reproduced. File naming: `{current time}-{subcommand}.yaml`.
    ///
    /// # Errors
    /// - if `serde_yaml` fails to parse `Self` to a string.
    /// - if the output file cannot be written.
    pub fn serialize(&self) -> Result<()> {
        let serialized = serde_yaml::to_string(&self)
            .context("Failed to serialize command line arguments")?;

        debug!("\n---- Command line args ----\n{serialized}\n---");

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S");
        let (common, module) = match &self.commands {
            Commands::Cluster { common, .. } => (common, "cluster"),
            Commands::Query   { common, .. } => (common, "query"),
        };
        if !common.output_dir.is_dir() {
            return Err(ParserError::InvalidOutputDir(common.output_dir.display().to_string()).into());
        }
        let output_file = common.output_dir.join(format!("{current_time}-{module}.yaml"));

        std::fs::write(&output_file, serialized)
            .with_context(|| format!("Unable to serialize arguments into {}", output_file.display()))
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Compare every record of the dataset against every other, within bins
    /// defined by the requested classification mode.
    Cluster {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        cluster: Cluster,
    },
    /// Compare query records against the reference set, then propagate
    /// through the reference network until no new edges appear.
    Query {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        query: Query,
    },
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Common {
    /// Path to the dataset + edge store SQLite database.
    ///
    /// The database must be pre-populated with annotated records (gbk,
    /// bgc_record, cds, hsp, hsp_alignment tables). Computed distances are
    /// written back into its 'distance' table.
    #[clap(short, long, required = true)]
    pub db: PathBuf,

    /// Output directory for run artifacts.
    #[clap(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of worker threads. 0 defaults to all available cores.
    #[clap(short, long, default_value_t = 0)]
    pub threads: usize,

    /// Number of pairs per worker batch. Leave unset for an automatic value
    /// balancing batch count against core count.
    #[clap(short, long)]
    pub batch_size: Option<usize>,

    /// Region extension strategy applied after seeding the comparable
    /// region.{n}
    /// - local : extend, then reset to the full range on a failed check{n}
    /// - glocal: always extend{n}
    /// - global: score the seeded region as-is{n}
    #[clap(short, long, arg_enum, default_value_t = AlignmentMode::Local)]
    pub alignment_mode: AlignmentMode,

    /// Weight profile selection.{n}
    /// - mix   : one profile for every bin{n}
    /// - legacy: per-class profiles from the legacy weight table{n}
    #[clap(short, long, arg_enum, default_value_t = WeightMode::Mix)]
    pub weight_mode: WeightMode,

    /// Order each pair's records lexicographically by GBK file stem before
    /// scoring. Reproduces the A/B-asymmetric scores of earlier versions.
    #[clap(long)]
    pub legacy_sort: bool,

    /// Record granularity entering the comparison: full regions, or their
    /// nested protoclusters / protocores.
    #[clap(short, long, arg_enum, default_value_t = RecordType::Region)]
    pub record_type: RecordType,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Cluster {
    /// How records are grouped into bins before pair generation.
    #[clap(short, long, arg_enum, default_value_t = ClassifyMode::Mix)]
    pub classify: ClassifyMode,

    /// When classifying by class, split hybrid products ("a.b") into both
    /// of their base-class bins instead of a dedicated hybrid bin.
    #[clap(long)]
    pub hybrids_off: bool,
}

#[derive(Args, Debug, Default, Serialize, Deserialize)]
pub struct Query {
    /// Maximum number of reference-propagation rounds. Unset runs until a
    /// round generates no new pairs.
    #[clap(long)]
    pub max_rounds: Option<usize>,
}

/// Comparable-region strategy for a pair, fixed per run.
#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentMode {
    Global,
    Glocal,
    Local,
}

impl Display for AlignmentMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Global => write!(f, "global"),
            Self::Glocal => write!(f, "glocal"),
            Self::Local  => write!(f, "local"),
        }
    }
}

/// Bin construction policy.
#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifyMode {
    /// A single bin holding every record.
    Mix,
    /// One bin per product annotation.
    Class,
    /// One bin per antiSMASH category.
    Category,
    /// The eight fixed product classes of the original implementation.
    Legacy,
}

impl Display for ClassifyMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Mix      => write!(f, "mix"),
            Self::Class    => write!(f, "class"),
            Self::Category => write!(f, "category"),
            Self::Legacy   => write!(f, "legacy"),
        }
    }
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightMode {
    Mix,
    Legacy,
}

impl Display for WeightMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Mix    => write!(f, "mix"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Which record granularity a run compares.
#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    Region,
    ProtoCluster,
    ProtoCore,
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Region       => write!(f, "region"),
            Self::ProtoCluster => write!(f, "proto-cluster"),
            Self::ProtoCore    => write!(f, "proto-core"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn alignment_mode_display() {
        assert_eq!(AlignmentMode::Local.to_string(), "local");
        assert_eq!(AlignmentMode::Glocal.to_string(), "glocal");
        assert_eq!(AlignmentMode::Global.to_string(), "global");
    }

    #[test]
    fn cluster_defaults() {
        let cli = Cli::parse_from(["domdist", "cluster", "--db", "run.db"]);
        let Commands::Cluster { common, cluster } = cli.commands else {
            panic!("expected cluster subcommand")
        };
        assert_eq!(common.alignment_mode, AlignmentMode::Local);
        assert_eq!(common.weight_mode, WeightMode::Mix);
        assert_eq!(cluster.classify, ClassifyMode::Mix);
        assert!(!cluster.hybrids_off);
        assert!(!common.legacy_sort);
    }
}
