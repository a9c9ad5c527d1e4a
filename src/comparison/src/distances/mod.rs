//! The three sub-scores combined into a pair's composite distance.

mod jaccard;
pub use jaccard::calc_jaccard_pair;

mod adjacency;
pub use adjacency::calc_ai_pair;

mod dss;
pub use dss::{aligned_string_dist, calc_dss_pair};

mod error;
pub use error::DistanceError;
