// ABOUTME: Default Memory Facade implementation (§6.3, §A.4)

use crate::capability::{MemoryFacade, MemoryLookup};
use std::collections::HashMap;

/// A Memory Facade with no backing store: every lookup returns an empty
/// result. The default when no project memory has been wired in.
pub struct NullMemory;

impl MemoryFacade for NullMemory {
    fn lookup_context(&self, _query_fragments: &HashMap<String, String>, _max_tokens: usize) -> MemoryLookup {
        MemoryLookup {
            summary: String::new(),
            matches: Vec::new(),
        }
    }
}
