//! Error type shared by every pipeline stage

/// Failures reported by the tree pipeline and scenario loading
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Bounds were requested for an empty body set
    #[error("cannot build a tree over an empty body set")]
    EmptySystem,

    /// A body position contains NaN or an infinity
    #[error("body {body} has a non-finite {axis} coordinate ({value})")]
    NonFiniteCoordinate {
        /// Index of the body in input order
        body: usize,
        /// Axis name (`x`, `y` or `z`)
        axis: char,
        /// Offending value
        value: f64,
    },

    /// A real-valued parameter is out of range
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in configuration
        name: &'static str,
        /// Rejected value
        value: f64,
        /// What the value must satisfy
        reason: &'static str,
    },

    /// Leaves must be allowed to hold at least one body
    #[error("invalid parameter `leaf_capacity` = 0: must be at least 1")]
    ZeroLeafCapacity,

    /// A configured body vector has the wrong number of components
    #[error("body {body}: `{field}` has {len} components, expected 3")]
    MalformedBody {
        /// Index of the body in the scenario
        body: usize,
        /// Field name (`x`, `v` or `a`)
        field: &'static str,
        /// Number of components found
        len: usize,
    },

    /// A sorter backend returned keys out of order
    #[error("sorter left Morton keys out of order at position {position}")]
    UnsortedKeys {
        /// First position whose key is smaller than its predecessor's
        position: usize,
    },

    /// A sorter backend dropped, duplicated or invented bodies
    #[error("sorter output at position {position} repeats or invents body {index}")]
    NotAPermutation {
        /// First sorted position whose body index was already seen or is out of range
        position: usize,
        /// Body index found there
        index: usize,
    },

    /// Accelerations were requested for a body slice of the wrong length
    #[error("tree holds {expected} bodies but {found} were passed")]
    BodyCountMismatch { expected: usize, found: usize },

    /// A body differs from the one the tree was built over
    #[error("body {body} does not match the body the tree was built from")]
    ForeignBody { body: usize },
}
