//! Infrastructure adapters. Implement outbound ports and serve the HTTP API.
//!
//! libsql storage, payment gateways, meeting rooms, mail. Map errors to DomainError.

pub mod http;
pub mod mail;
pub mod meetings;
pub mod payments;
pub mod persistence;
