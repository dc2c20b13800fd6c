//! One-shot fault injection owned by the test harness

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that makes the next `log_request` fail with a serialization
/// error. Cloning shares the flag; the handler disarms it when it fires.
#[derive(Debug, Clone, Default)]
pub struct FaultToggle(Arc<AtomicBool>);

impl FaultToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Disarm and report whether the flag was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_across_clones() {
        let harness = FaultToggle::new();
        let handler_side = harness.clone();
        assert!(!handler_side.take());
        harness.arm();
        assert!(handler_side.is_armed());
        assert!(handler_side.take());
        assert!(!handler_side.take());
        assert!(!harness.is_armed());
    }
}
