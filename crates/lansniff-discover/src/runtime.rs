//! Runtime for the one-shot CLI.
//!
//! A reverse DNS lookup that outlived its timeout is still parked on a
//! blocking-pool thread. Dropping a runtime waits for those threads, so
//! [`run`] shuts down in the background instead and lets the process exit
//! once the scan future has finished.

use std::future::Future;
use std::io;

/// Drive `future` to completion on a fresh multi-threaded runtime, then
/// abandon whatever blocking work is still in flight.
pub fn run<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}
