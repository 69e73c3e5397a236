//! Stackwire - stack composition engine
//!
//! Stacks are built into a single construct tree, publish values under
//! global export names and import each other's exports. Synthesis seals the
//! export registry, resolves every import, derives the dependency graph,
//! rejects cycles and scope mismatches and produces a deterministic
//! deployment order. Pipelines group stacks into stages, hand them to a
//! provisioner and notify observers about state transitions.

pub mod app;
pub mod config;
pub mod construct;
pub mod error;
pub mod executor;
pub mod exports;
pub mod hash;
pub mod pipeline;
pub mod resolver;
pub mod resource;
pub mod stack;
pub mod synth;

pub use app::{App, ConstructionKey, MAX_NESTING_DEPTH};
pub use error::{Result, StackwireError};
pub use exports::{ExportRegistry, ImportHandle, OutputValue};
pub use stack::{DeploymentScope, StackBuilder, StackContext, StackDefinition, StackId};
pub use synth::SynthesisPlan;
