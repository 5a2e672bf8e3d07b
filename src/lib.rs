//! # modforge - Multi-Module Build Orchestrator
//!
//! modforge drives a project made of independent modules, each building its own
//! static library, plus a consumer that links them all into one executable and an
//! optional server built alongside.
//!
//! ## Pipeline
//!
//! - **Discover**: immediate subdirectories of the root, minus an exclusion set
//! - **Libs**: build each module, promote its library only if the bytes changed,
//!   copy its API header into the shared staging directory
//! - **Bin**: link the consumer against every promoted library
//! - **Server**: independent subordinate build
//!
//! ## Quick Start
//!
//! ```bash
//! # Build libraries, executable and server
//! mf
//!
//! # Debug build with four parallel module builds
//! mf --mode debug -j 4 libs
//! ```
//!
//! ## Module Organization
//!
//! - [`naming`] - Module name to library/header name mapping
//! - [`discovery`] - Module enumeration
//! - [`build`] - Subordinate build invocations
//! - [`sync`] - Change-detected artifact promotion
//! - [`headers`] - API header propagation
//! - [`orchestrator`] - Target resolution and sequencing

/// Subordinate build invocations (modules, consumer, server, clean).
pub mod build;

/// Configuration file parsing (`forge.toml`) and resolved build settings.
pub mod config;

/// Module discovery.
pub mod discovery;

/// Error taxonomy.
pub mod error;

/// API header propagation.
pub mod headers;

/// Module name normalization.
pub mod naming;

/// Target resolution and stage sequencing.
pub mod orchestrator;

/// Change-detected promotion of module libraries.
pub mod sync;

/// Terminal UI utilities (status lines, progress, tables).
pub mod ui;

pub use error::{ForgeError, Result};
pub use orchestrator::{Orchestrator, Target};
