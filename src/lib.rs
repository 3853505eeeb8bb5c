//! ferryd - resumable client/server file transfer.
//!
//! A hand-rolled line-and-control-byte protocol over TCP, with an auxiliary
//! sequenced-datagram transport over UDP. The server tracks in-flight
//! transfers per logical session (keyed by a client-issued durable token, not
//! the TCP connection) so an interrupted transfer resumes byte-exact after a
//! reconnect.

pub mod client;
pub mod config;
pub mod constants;
pub mod core_cli;
pub mod core_command;
pub mod core_protocol;
pub mod core_session;
pub mod core_token;
pub mod core_transfer;
pub mod helpers;
pub mod server;
