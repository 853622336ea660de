// Cluster chain resolution
// Walks the singly linked FAT list with an explicit iteration bound

use super::fat_table::{FatEntry, FatTable};
use crate::fat_common::constants::FIRST_DATA_CLUSTER;
use fatlens_core::{FatError, FatResult};
use log::{trace, warn};

/// Ordered clusters of one file or directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterChain {
    clusters: Vec<u16>,
}

impl ClusterChain {
    pub fn clusters(&self) -> &[u16] {
        &self.clusters
    }

    pub fn get(&self, index: usize) -> Option<u16> {
        self.clusters.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Bytes addressable through this chain
    pub fn capacity_bytes(&self, cluster_size: u64) -> u64 {
        self.clusters.len() as u64 * cluster_size
    }
}

/// Follow the FAT from `start` to the end-of-chain marker
///
/// A start of 0 or 1 yields an empty chain (empty files, the FAT16 root).
/// Fails with `CorruptChain` on out-of-range links, bad-cluster markers and
/// cycles; a returned chain never repeats a cluster.
pub fn resolve_chain(fat: &FatTable, start: u16) -> FatResult<ClusterChain> {
    if start < FIRST_DATA_CLUSTER {
        return Ok(ClusterChain::default());
    }

    let limit = fat.len();
    let mut visited = vec![false; limit];
    let mut clusters = Vec::new();
    let mut current = start;

    loop {
        let index = current as usize;
        if index >= limit {
            return Err(FatError::CorruptChain(format!(
                "cluster {} is outside the FAT ({} entries)",
                current, limit
            )));
        }
        if visited[index] || clusters.len() >= limit {
            return Err(FatError::CorruptChain(format!(
                "cycle detected at cluster {} in chain starting at {}",
                current, start
            )));
        }
        visited[index] = true;
        clusters.push(current);

        match fat.entry(current)? {
            FatEntry::Next(next) => current = next,
            FatEntry::EndOfChain => break,
            FatEntry::Bad(value) => {
                return Err(FatError::CorruptChain(format!(
                    "cluster {} links to reserved/bad marker {:#06x}",
                    current, value
                )));
            }
            FatEntry::Free | FatEntry::Reserved => {
                warn!(
                    "Chain starting at {} runs into a free/reserved entry after cluster {}",
                    start, current
                );
                break;
            }
        }
    }

    trace!("Resolved chain from {}: {} clusters", start, clusters.len());
    Ok(ClusterChain { clusters })
}
