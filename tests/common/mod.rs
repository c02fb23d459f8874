#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)]

use opentui_text::TextBuffer;
use std::sync::Once;

pub fn setup_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Every handle stored in the buffer's cells resolves and is referenced at
/// least as often as it appears.
pub fn assert_handles_live(buffer: &TextBuffer) {
    let pool = buffer.pool().borrow();
    let mut counts = std::collections::HashMap::new();
    for handle in buffer.grapheme_handles() {
        *counts.entry(handle).or_insert(0u32) += 1;
    }
    for (handle, uses) in counts {
        assert!(pool.resolve(handle).is_ok(), "handle {handle:?} does not resolve");
        assert!(
            pool.refcount(handle) >= uses,
            "handle {handle:?} used {uses} times but refcount is {}",
            pool.refcount(handle)
        );
    }
}
