//! # netfacts
//!
//! Collect structured operational facts from network devices by scraping
//! CLI show commands.
//!
//! Each [`FactCategory`] issues a fixed, ordered set of show commands and
//! turns the text the device prints into typed records: BGP and IS-IS
//! neighbors, interfaces with their LLDP neighbors, LAG membership and
//! transceiver readings, hardware inventory and sensors, software version
//! and the running configuration.
//!
//! ## Features
//!
//! - Line-rule parse engine with scoped state (entity, sub-scope, locals)
//! - Degraded output never fails a collection: unsupported commands,
//!   transport errors and parse anomalies become warnings
//! - Async SSH sessions via russh with OcNOS prompt and mode handling
//! - Offline replay of captured output for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netfacts::{Collector, FactCategory, SessionBuilder, SharedSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netfacts::Error> {
//!     let mut session = SessionBuilder::new("192.0.2.10")
//!         .username("ocnos")
//!         .password("ocnos")
//!         .build()?;
//!     session.open().await?;
//!
//!     let session = SharedSession::new(session);
//!     let collection = Collector::default()
//!         .collect_all(&session, &FactCategory::ALL)
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&collection.facts).unwrap());
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod facts;
pub mod parse;
pub mod platform;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use facts::{
    Collection, Collector, CommandRegistry, CommandSet, FactCategory, FactReport, Facts, extract,
};
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use session::{
    CommandSource, RawCommandResult, ReplaySource, Response, SessionBuilder, SharedSession,
    SshSession,
};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
