//! Incidents - failures reported to the host instead of being propagated

mod incident;

pub use incident::{Incident, IncidentKind, IncidentSink, TracingSink};
