//! Assignee selection for scraped incidents.
//!
//! Incidents arrive without an owner, so the pipeline assigns one from a
//! fixed placeholder pool. The strategy is injected so tests can
//! substitute a deterministic implementation.

use rand::seq::SliceRandom;

/// User ids that scraped tasks are distributed across. Placeholder
/// policy, not an ownership model — the rows are seeded by migration.
pub const DEFAULT_ASSIGNEE_POOL: [i32; 3] = [1, 2, 3];

/// Picks the user a scraped task is assigned to.
pub trait AssignmentStrategy: Send + Sync {
    fn assign(&self) -> i32;
}

/// Uniform random pick from a fixed pool.
pub struct RandomAssigner {
    pool: Vec<i32>,
}

impl RandomAssigner {
    /// An empty pool is replaced with the default one so `assign` always
    /// has something to pick from.
    pub fn new(pool: Vec<i32>) -> Self {
        let pool = if pool.is_empty() {
            DEFAULT_ASSIGNEE_POOL.to_vec()
        } else {
            pool
        };
        Self { pool }
    }
}

impl Default for RandomAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_ASSIGNEE_POOL.to_vec())
    }
}

impl AssignmentStrategy for RandomAssigner {
    fn assign(&self) -> i32 {
        *self
            .pool
            .choose(&mut rand::thread_rng())
            .expect("assignee pool is never empty")
    }
}

/// Always assigns the same user. For tests.
pub struct FixedAssigner(pub i32);

impl AssignmentStrategy for FixedAssigner {
    fn assign(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_assigner_stays_within_pool() {
        let assigner = RandomAssigner::default();
        for _ in 0..50 {
            let id = assigner.assign();
            assert!(DEFAULT_ASSIGNEE_POOL.contains(&id));
        }
    }

    #[test]
    fn empty_pool_falls_back_to_default() {
        let assigner = RandomAssigner::new(vec![]);
        assert!(DEFAULT_ASSIGNEE_POOL.contains(&assigner.assign()));
    }

    #[test]
    fn fixed_assigner_is_deterministic() {
        let assigner = FixedAssigner(2);
        assert_eq!(assigner.assign(), 2);
        assert_eq!(assigner.assign(), 2);
    }
}
