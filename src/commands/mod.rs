//! Command implementations for Stackwire CLI

pub mod completions;
pub mod deploy;
pub mod graph;
pub mod synth;
pub mod validate;
pub mod version;

use std::path::Path;

use stackwire::SynthesisPlan;
use stackwire::config::{AssemblyManifest, ContextOverrides};
use stackwire::error::Result;

/// Load a manifest and synthesize the assembly it declares
pub(crate) fn synthesize(
    file: &Path,
    overrides: &ContextOverrides,
) -> Result<(AssemblyManifest, SynthesisPlan)> {
    let manifest = AssemblyManifest::load(file)?;
    let plan = manifest.build_app(overrides)?.synth()?;
    Ok((manifest, plan))
}
