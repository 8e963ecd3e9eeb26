// # hostreg-core
//
// Core library for the host registry client.
//
// ## Architecture Overview
//
// The client keeps a local view of the DHCP/DNS host reservations held by a
// remote appliance API and reconciles it with that authoritative store:
// - **EndpointConfig**: Which appliance the client is talking to (unset at startup)
// - **HostTransport**: Trait for the four remote operations (list, create, delete, update)
// - **RegistryCache**: Last known server state, replaced wholesale on every sync
// - **Workflow**: The single active modal interaction (endpoint entry, delete confirmation, edit)
// - **RegistryEngine**: Coordinates validate → remote call → cache update → notify
//
// ## Design Principles
//
// 1. **Server Authority**: The cache only changes after the remote store accepted a change
// 2. **Intent-Driven**: The presentation layer sends `Intent`s and renders snapshots
// 3. **Injectable Context**: Transport, endpoint and workflow are owned by the engine, not globals
// 4. **Library-First**: The console front-end is a thin layer over this crate
// 5. **No Silent Failures**: Every failed operation produces a notification

pub mod cache;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod traits;
pub mod workflow;

// Re-export core types for convenience
pub use cache::RegistryCache;
pub use config::ClientConfig;
pub use endpoint::{Endpoint, EndpointConfig, DEFAULT_API_PORT};
pub use engine::{Intent, Notification, NotificationKind, RegistryEngine};
pub use error::{Error, Result};
pub use traits::{HostRecord, HostTransport, HostUpdate, NewHost};
pub use workflow::{DraftEdit, Workflow, WorkflowState};
