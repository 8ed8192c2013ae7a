//! Core business entities and value objects: connector state (C1),
//! configuration store (C2), charging profiles, and the station aggregate.

pub mod charging_profile;
pub mod configuration;
pub mod connector;
pub mod error;
pub mod ocpp;
pub mod station;

pub use connector::{Connector, ConnectorSet};
pub use error::{DomainError, DomainResult};
pub use station::{AtgConfig, StationDescriptor, StationState};
