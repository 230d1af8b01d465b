//! Per-target serialization.
//!
//! Creating an operation and propagating a target's chain both read and then
//! rewrite the target's rows, so two writers must never interleave on the same
//! target. Writers on different targets run in parallel.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as TargetMutex, OwnedMutexGuard};

use crate::Target;

type LockMap = Arc<Mutex<HashMap<Target, Arc<TargetMutex<()>>>>>;

/// Held locks; dropping it releases every target.
#[derive(Debug)]
pub(crate) struct TargetGuards {
    guards: Vec<(Target, OwnedMutexGuard<()>)>,
    map: LockMap,
}

impl Drop for TargetGuards {
    /// Forget the targets nobody else holds or waits on, so the map only
    /// tracks targets in use.
    fn drop(&mut self) {
        let targets: Vec<Target> = self.guards.drain(..).map(|(target, _)| target).collect();
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        for target in targets {
            if map
                .get(&target)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                map.remove(&target);
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TargetLocks {
    inner: LockMap,
}

impl TargetLocks {
    fn handle(&self, target: Target) -> Arc<TargetMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(target).or_default().clone()
    }

    /// Lock every distinct target, in ascending target order.
    ///
    /// The fixed order rules out deadlocks between two writers sharing more
    /// than one target (a `give` touches two accounts).
    pub(crate) async fn acquire<I>(&self, targets: I) -> TargetGuards
    where
        I: IntoIterator<Item = Target>,
    {
        let ordered: BTreeSet<Target> = targets.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for target in ordered {
            guards.push((target, self.handle(target).lock_owned().await));
        }
        TargetGuards {
            guards,
            map: Arc::clone(&self.inner),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
