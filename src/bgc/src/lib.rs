pub mod gbk;
pub use gbk::{Gbk, SourceType};

pub mod cds;
pub use cds::{Cds, GeneKind, Strand};

pub mod hsp;
pub use hsp::{Hsp, HspAlignment};

pub mod record;
pub use record::{Record, RecordKind};

pub mod dataset;
pub use dataset::{Dataset, RecordView};

pub mod domains;
pub use domains::DomainSeq;

mod error;
pub use error::ModelError;
