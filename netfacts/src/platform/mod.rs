//! Platform definitions: prompts, CLI modes and output markers of the
//! device families a session can talk to.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::{PlatformDefinition, Verdict};
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;
