//! Traced bin factory

use std::collections::BTreeMap;

use crate::backend::debug::{DebugBackend, RenderOutput};
use crate::backend::memory::MemoryBackend;

/// Hands out one traced memory bin per name, all sharing one render output
pub struct DebugBackendFactory {
    output: RenderOutput,
    bins: BTreeMap<String, DebugBackend>,
}

impl DebugBackendFactory {
    pub fn new(output: RenderOutput) -> Self {
        Self {
            output,
            bins: BTreeMap::new(),
        }
    }

    /// Get the bin, creating it on first use
    pub fn get(&mut self, bin: &str) -> &mut DebugBackend {
        let output = &self.output;
        self.bins.entry(bin.to_string()).or_insert_with(|| {
            tracing::debug!(bin, "creating traced cache bin");
            DebugBackend::new(MemoryBackend::new(bin), output.clone())
        })
    }

    /// Names of the bins created so far, sorted
    pub fn bins(&self) -> Vec<&str> {
        self.bins.keys().map(|k| k.as_str()).collect()
    }
}
