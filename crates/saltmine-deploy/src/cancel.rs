use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Set-once cancellation flag shared between the signal handler and the run
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raw flag, for search loops that poll an `AtomicBool` directly
    pub fn as_flag(&self) -> &AtomicBool {
        &self.flag
    }
}

/// Stop conditions for a single contract's search
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    pub cancel: CancelToken,
    /// Wall-clock budget per contract (`None` = unlimited)
    pub deadline: Option<Duration>,
}

impl SearchControl {
    pub fn new(cancel: CancelToken, deadline: Option<Duration>) -> Self {
        Self { cancel, deadline }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let handler_copy = token.clone();
        assert!(!token.is_cancelled());

        handler_copy.cancel();
        assert!(token.is_cancelled());
        assert!(token.as_flag().load(Ordering::Relaxed));
    }
}
