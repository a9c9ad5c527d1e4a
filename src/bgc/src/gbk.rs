use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cds::Cds;
use crate::ModelError;

/// Provenance of a GBK file within a run. Reference records come from a
/// pre-annotated database; query records from the user's input folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Query,
    Reference,
}

impl FromStr for SourceType {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query"     | "QUERY"     => Ok(Self::Query),
            "reference" | "REFERENCE" => Ok(Self::Reference),
            other                     => Err(ModelError::UnknownSourceType(other.to_string())),
        }
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Query     => write!(f, "query"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// A single input GBK file: the provenance unit of the dataset.
///
/// A GBK owns the ordered list of CDS found within it; records reference
/// slices of this list by index range.
/// # Fields
/// - `db_id`      : persistent id of this GBK within the store.
/// - `path`       : path of the originating file.
/// - `source_type`: whether this file belongs to the query or reference set.
/// - `genes`      : every CDS of the file, ordered by start coordinate.
#[derive(Debug)]
pub struct Gbk {
    pub db_id      : i64,
    pub path       : PathBuf,
    pub source_type: SourceType,
    pub genes      : Vec<Cds>,
}

impl Gbk {
    #[must_use]
    pub fn new(db_id: i64, path: impl AsRef<Path>, source_type: SourceType) -> Self {
        Self { db_id, path: path.as_ref().to_path_buf(), source_type, genes: Vec::new() }
    }

    /// File name without its extension. Used as the record ordering key when
    /// legacy sorting is requested.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_roundtrip() {
        for source in ["query", "reference"] {
            let parsed: SourceType = source.parse().unwrap();
            assert_eq!(format!("{parsed}"), source);
        }
    }

    #[test]
    fn source_type_unknown() {
        assert!("local".parse::<SourceType>().is_err());
    }

    #[test]
    fn file_stem_strips_extension() {
        let gbk = Gbk::new(1, "/data/BGC0000001.region001.gbk", SourceType::Query);
        assert_eq!(gbk.file_stem(), "BGC0000001.region001");
    }
}
