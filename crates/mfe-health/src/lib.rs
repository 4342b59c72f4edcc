//! Passive availability monitoring for remote participants.
//!
//! Provides:
//! - `EndpointProbe` - Liveness probe seam (`HttpProbe` for real use)
//! - `HealthMonitor` - Recurring status checks with a diagnostics map

pub mod monitor;
pub mod probe;

pub use monitor::{HealthMonitor, MfeStatus, MonitorConfig};
pub use probe::{EndpointProbe, HttpProbe};
