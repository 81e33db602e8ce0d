#![allow(dead_code)]

use std::time::Duration;

use gatewire::dispatcher::DispatcherHandle;

/// Request loop shutdown after `ms` milliseconds, like Ctrl-C would.
pub fn stop_after<M: Send + 'static>(handle: DispatcherHandle<M>, ms: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        handle.begin_shutdown();
    });
}

/// Post `message` after `ms` milliseconds.
pub fn post_after<M: Send + 'static>(handle: DispatcherHandle<M>, ms: u64, message: M) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        handle.post(message);
    });
}

/// Console output as lines.
pub fn lines(out: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(out)
        .lines()
        .map(str::to_string)
        .collect()
}
