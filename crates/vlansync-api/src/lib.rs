// vlansync-api: Async Rust clients for FortiGate switch-controller and NetBox

pub mod cache;
pub mod error;
pub mod fortigate;
pub mod netbox;
pub mod retry;
pub mod transport;

pub use cache::{CacheEntry, ResponseCache};
pub use error::Error;
pub use fortigate::FortiGateClient;
pub use netbox::NetBoxClient;
pub use retry::RetryPolicy;
pub use transport::{TlsMode, TransportConfig};
