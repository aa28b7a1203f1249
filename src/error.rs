//! Error taxonomy for the metrics engine.
//!
//! Unknown metric names are not errors: queries report them as `None`.

use crate::metrics::InstrumentKind;

pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// A measurement or instrument was given an empty name
    #[error("metric name must not be empty")]
    EmptyMetricName,

    /// The name is already bound to an instrument of another kind
    #[error("metric {name} is a {registered:?}, not a {requested:?}")]
    InstrumentKindMismatch {
        name: String,
        registered: InstrumentKind,
        requested: InstrumentKind,
    },

    /// Wiring-time failure: a required collaborator was never supplied
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `tag=` query parameter that is not `key:value`
    #[error("invalid tag parameter {0:?}, expected key:value")]
    InvalidTagParameter(String),

    /// Transport-level request that could not be parsed
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
