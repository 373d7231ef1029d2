//! Budget tracker — a shared token ledger for one orchestration run.
//!
//! Concurrent job workers all reserve through the same tracker, so the
//! check-and-commit is a single locked operation. Running out of budget is
//! never an error: the pipeline driver marks the run `partial` instead.

use std::sync::Mutex;

use tracing::debug;

struct Ledger {
    used: u32,
    total: u32,
}

pub struct BudgetTracker {
    inner: Mutex<Ledger>,
}

impl BudgetTracker {
    pub fn new(total: u32) -> Self {
        Self {
            inner: Mutex::new(Ledger { used: 0, total }),
        }
    }

    /// Atomically reserves `estimate` tokens. Returns false without
    /// mutating when the reservation would exceed the ceiling.
    pub fn reserve(&self, estimate: u32) -> bool {
        let mut ledger = self.lock();
        match ledger.used.checked_add(estimate) {
            Some(next) if next <= ledger.total => {
                ledger.used = next;
                debug!(reserved = estimate, used = next, total = ledger.total, "budget reserved");
                true
            }
            _ => {
                debug!(
                    requested = estimate,
                    used = ledger.used,
                    total = ledger.total,
                    "budget reservation refused"
                );
                false
            }
        }
    }

    /// Replaces an earlier reservation with the actual usage once the call
    /// completed (or with 0 if it failed before consuming anything).
    pub fn reconcile(&self, reserved: u32, actual: u32) {
        let mut ledger = self.lock();
        ledger.used = ledger.used.saturating_sub(reserved).saturating_add(actual);
    }

    pub fn used(&self) -> u32 {
        self.lock().used
    }

    pub fn total(&self) -> u32 {
        self.lock().total
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_commits_within_budget() {
        let budget = BudgetTracker::new(1000);
        assert!(budget.reserve(400));
        assert!(budget.reserve(600));
        assert_eq!(budget.used(), 1000);
    }

    #[test]
    fn test_reserve_refuses_without_mutation() {
        let budget = BudgetTracker::new(500);
        assert!(budget.reserve(300));
        assert!(!budget.reserve(300));
        assert_eq!(budget.used(), 300);
    }

    #[test]
    fn test_reconcile_rolls_back_to_actual() {
        let budget = BudgetTracker::new(10_000);
        assert!(budget.reserve(5_000));
        budget.reconcile(5_000, 1_200);
        assert_eq!(budget.used(), 1_200);
    }

    #[test]
    fn test_reconcile_to_zero_frees_the_reservation() {
        let budget = BudgetTracker::new(1_000);
        assert!(budget.reserve(800));
        budget.reconcile(800, 0);
        assert_eq!(budget.used(), 0);
        assert!(budget.reserve(900));
    }

    #[test]
    fn test_concurrent_reserves_never_overspend() {
        use std::sync::Arc;

        let budget = Arc::new(BudgetTracker::new(1_000));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let budget = Arc::clone(&budget);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        budget.reserve(7);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(budget.used() <= 1_000);
    }
}
