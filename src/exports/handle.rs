//! Forward-reference import handles and the per-run resolution table

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{Result, import_not_resolved};
use crate::stack::StackId;

static NEXT_RUN: AtomicU64 = AtomicU64::new(1);

/// Identifier of one synthesis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RunId(u64);

impl RunId {
    /// Allocate a run id never handed out before in this process
    pub(crate) fn next() -> Self {
        Self(NEXT_RUN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Identifier of one declared import within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ImportId(pub(crate) usize);

/// Opaque, unresolved reference to another stack's export
///
/// A handle carries no value. Its value can only be read from the
/// [`ResolvedImports`] produced by the same run that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportHandle {
    #[serde(skip)]
    id: ImportId,
    #[serde(rename = "import")]
    export_name: String,
    #[serde(skip)]
    consumer: StackId,
    #[serde(skip)]
    run: RunId,
}

impl ImportHandle {
    pub(crate) fn new(id: ImportId, export_name: String, consumer: StackId, run: RunId) -> Self {
        Self {
            id,
            export_name,
            consumer,
            run,
        }
    }

    pub fn id(&self) -> ImportId {
        self.id
    }

    pub fn export_name(&self) -> &str {
        &self.export_name
    }

    pub fn consumer(&self) -> StackId {
        self.consumer
    }

    pub fn run(&self) -> RunId {
        self.run
    }
}

/// Import values of one run, available only once resolution completed
#[derive(Debug, Clone)]
pub struct ResolvedImports {
    run: RunId,
    values: HashMap<ImportId, String>,
}

impl ResolvedImports {
    pub(crate) fn new(run: RunId, values: HashMap<ImportId, String>) -> Self {
        Self { run, values }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read the resolved value behind `handle`
    ///
    /// Fails with `ImportNotResolved` for handles issued by another run.
    pub fn get(&self, handle: &ImportHandle) -> Result<&str> {
        if handle.run != self.run {
            return Err(import_not_resolved(handle.export_name.as_str()));
        }
        self.values
            .get(&handle.id)
            .map(String::as_str)
            .ok_or_else(|| import_not_resolved(handle.export_name.as_str()))
    }
}
