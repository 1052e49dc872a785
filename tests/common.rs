#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

/// How long a blocked operation must stay blocked to count as blocked.
pub const BLOCK_WINDOW: Duration = Duration::from_millis(200);

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        channelqueue::logging::init_logging();
    });
}
