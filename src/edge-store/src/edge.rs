/// One scored pair, as persisted in the `distance` table.
///
/// `lcs_*` coordinates are the seeded comparable region and `ext_*` the
/// final (possibly extended, then inflated) window, both on the CDS axis.
/// When `reverse` is set, the B-side coordinates are expressed in B's
/// reversed coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub record_a_id  : i64,
    pub record_b_id  : i64,
    pub distance     : f64,
    pub jaccard      : f64,
    pub adjacency    : f64,
    pub dss          : f64,
    pub edge_param_id: i64,
    pub lcs_a_start  : usize,
    pub lcs_a_stop   : usize,
    pub lcs_b_start  : usize,
    pub lcs_b_stop   : usize,
    pub ext_a_start  : usize,
    pub ext_a_stop   : usize,
    pub ext_b_start  : usize,
    pub ext_b_stop   : usize,
    pub reverse      : bool,
}
