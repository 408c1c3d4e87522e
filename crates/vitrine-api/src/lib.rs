// vitrine-api: Async Rust client for Vitrine's JSON resource endpoints.
//
// Every admin resource (products, services, applications, ...) is exposed
// under the same REST shape, so one `ResourceClient` serves them all.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::ResourceClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{Payload, Record, WireId};
