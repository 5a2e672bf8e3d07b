//! API header propagation.
//!
//! Headers are copied into the shared API directory on every pass without
//! comparing content. A module without a header only produces a warning, since
//! some modules expose no public API.

use crate::config::Layout;
use crate::discovery::Module;
use crate::error::Result;
use crate::sync::install_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    Copied,
    Missing,
}

pub fn propagate_header(module: &Module, layout: &Layout) -> Result<HeaderStatus> {
    let source = module.header_source();
    if !source.is_file() {
        tracing::debug!(module = %module.name, "no header at {}", source.display());
        return Ok(HeaderStatus::Missing);
    }

    install_file(&source, &module.shared_header(layout))?;
    Ok(HeaderStatus::Copied)
}
