//! Access analyses over offloaded tasks
//!
//! - [`loop_unique`]: per-task loop-invariance / loop-uniqueness classification
//! - [`uniquely_accessed`]: storage nodes each iteration accesses exclusively
//! - [`bit_struct`]: the same, folded onto physical bit-struct containers
//! - [`alias`]: the alias / value-equality oracle the gatherers consult
//! - [`manager`]: cache of pass results
//! - [`report`]: serializable summary of results for the driver

pub mod alias;
pub mod bit_struct;
pub mod loop_unique;
pub mod manager;
pub mod report;
pub mod uniquely_accessed;

pub use alias::{AliasOracle, AliasResult, StructuralAliasOracle};
pub use bit_struct::{
    gather_uniquely_accessed_bit_structs, gather_uniquely_accessed_bit_structs_with_config,
    GatherUniquelyAccessedBitStructsPass, UniquelyAccessedBitStructGatherer,
    UniquelyAccessedBitStructs,
};
pub use loop_unique::{is_address_loop_unique, LoopUniqueStmtSearcher, LoopUniqueness};
pub use manager::{AnalysisManager, Pass};
pub use report::{AccessEntry, AnalysisReport, TaskReport};
pub use uniquely_accessed::{
    gather_uniquely_accessed_pointers, num_loop_indices, UniquelyAccessedPointers,
    UniquelyAccessedSNodeSearcher,
};

use serde::{Deserialize, Serialize};

/// Analysis options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analyze independent tasks on the rayon thread pool
    pub parallel_tasks: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let config: AnalysisConfig = toml::from_str("parallel_tasks = true").unwrap();
        assert!(config.parallel_tasks);
        let config: AnalysisConfig = toml::from_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
