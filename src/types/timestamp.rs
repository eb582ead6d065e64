use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub physical: u64, // Milliseconds since epoch
    pub logical: u64,  // Monotonic counter
}

impl Timestamp {
    pub fn now() -> Self {
        HLC.now()
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp {
            physical: millis,
            logical: 0,
        }
    }
}

/// Hybrid logical clock: ledger record timestamps stay strictly ordered even
/// when the wall clock stalls or steps backward.
pub struct HybridLogicalClock {
    last_physical: AtomicU64,
    last_logical: AtomicU64,
}

impl HybridLogicalClock {
    pub fn new() -> Self {
        HybridLogicalClock {
            last_physical: AtomicU64::new(0),
            last_logical: AtomicU64::new(0),
        }
    }

    pub fn now(&self) -> Timestamp {
        let wall_clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        loop {
            let last_physical = self.last_physical.load(Ordering::SeqCst);
            let last_logical = self.last_logical.load(Ordering::SeqCst);

            let (new_physical, new_logical) = if wall_clock > last_physical {
                (wall_clock, 0)
            } else {
                (last_physical, last_logical + 1)
            };

            if self
                .last_physical
                .compare_exchange(last_physical, new_physical, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                self.last_logical.store(new_logical, Ordering::SeqCst);
                return Timestamp {
                    physical: new_physical,
                    logical: new_logical,
                };
            }
            // Retry if CAS failed
        }
    }
}

impl Default for HybridLogicalClock {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    static ref HLC: HybridLogicalClock = HybridLogicalClock::new();
}
