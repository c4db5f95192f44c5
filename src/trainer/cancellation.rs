use std::sync::atomic::{AtomicBool, Ordering};

use crate::prelude::*;

/// Cooperative cancellation flag, shared between the trainer and its owner.
///
/// The trainer checks the flag before every epoch.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
