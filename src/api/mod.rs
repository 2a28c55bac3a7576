//! Backend API access: transport seam, typed client, wire types.

pub mod client;
pub mod transport;
pub mod types;

pub use client::ScenarioClient;
pub use transport::{ApiReply, HttpTransport, Method, Transport};
