//! Core traits for the host registry client
//!
//! - [`HostTransport`]: Perform remote operations against the appliance API

pub mod host_transport;

pub use host_transport::{HostRecord, HostTransport, HostUpdate, NewHost};
