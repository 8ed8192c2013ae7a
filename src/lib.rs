//! OCPP 1.6-J charge point simulator: a fleet of simulated charging
//! stations, each running the Core/FirmwareManagement/SmartCharging/
//! RemoteTrigger profile surface plus an Automatic Transaction Generator,
//! talking to a Central System over OCPP-J WebSockets.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod support;
