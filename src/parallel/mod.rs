//! Parallel fan-out over independent replay logs.
//!
//! The engine keeps all working state local to one [reconstruct_game] call,
//! so logs reconstruct with zero coordination. This module provides the
//! batch helpers callers use to spread a backlog of logs across workers.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::reconstruct::{reconstruct_game, GameRecords};
use crate::replay::ReplayLog;

/// Configures how many worker threads reconstruct a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the global Rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a pool with this worker count; 0 uses the global
    /// Rayon pool (all cores).
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .expect("Rayon thread pool");
            pool.install(f)
        }
    }
}

/// Reconstruct every log in parallel. Output order matches input order.
pub fn reconstruct_batch(logs: &[ReplayLog], pool: &WorkerPool) -> Vec<GameRecords> {
    pool.install(|| logs.par_iter().map(reconstruct_game).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::ReplayLog;

    #[test]
    fn reconstruct_batch_preserves_input_order() {
        let logs: Vec<ReplayLog> = (1..=4)
            .map(|id| ReplayLog {
                table_id: id,
                ..ReplayLog::default()
            })
            .collect();
        let records = reconstruct_batch(&logs, &WorkerPool::default());
        let ids: Vec<u64> = records.iter().map(|r| r.table_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
