//! A cheap, cloneable cancellation flag.
//!
//! The response reader polls this between chunks, never mid-chunk: it holds
//! no internal scheduling of its own and relies on the transport to unblock
//! a pending read. Tripping a clone trips every clone; there is no un-cancel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
