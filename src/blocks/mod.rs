// src/blocks/mod.rs

// ============================================================================
// Submodules
// ============================================================================

mod aggregator;
mod block;

// Re-export block types
pub use aggregator::{Aggregate, BlockAggregator};
pub use block::{Block, BlockFactory, BlockKind};
