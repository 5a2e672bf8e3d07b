//! Subordinate builds: module libraries, the consumer executable, the server,
//! and delegated cleans. Everything here goes through a [`Backend`].

mod aggregate;
mod backend;
mod clean;
mod driver;

pub use aggregate::{SharedArtifacts, binary_invocation, build_binary, build_server};
pub use backend::{Backend, Invocation, MakeBackend, Outcome};
pub use clean::{delegate_clean, remove_dir};
pub use driver::{build_module, module_invocation};
