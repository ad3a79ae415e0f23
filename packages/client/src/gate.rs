use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-flight flag held by [`RedemptionClient`](crate::RedemptionClient). A
/// second attempt is refused locally while the first one is still running.
#[derive(Debug, Clone, Default)]
pub struct RedemptionGate {
    busy: Arc<AtomicBool>,
}

impl RedemptionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<InFlight> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_attempt_is_refused_until_release() {
        let gate = RedemptionGate::new();

        let first = gate.try_acquire();
        assert!(first.is_some());
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());

        drop(first);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_flag() {
        let gate = RedemptionGate::new();
        let other = gate.clone();

        let _held = gate.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }
}
