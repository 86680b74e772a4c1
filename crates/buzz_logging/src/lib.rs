#![deny(missing_docs)]
//! Shared logging utilities for the buzz workspace.
//!
//! This crate provides the `buzz_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Messages logged while
//! a crawl is scrolling are prefixed with the current scroll iteration, e.g.
//! `[scroll 4] processed 12 posts`.

use std::cell::Cell;
use std::future::Future;

#[doc(hidden)]
pub use log;

tokio::task_local! {
    /// Scroll iteration of the crawl running in the current task.
    static SCROLL_ITERATION: Cell<u32>;
}

/// Runs `fut` with its own scroll iteration, starting at 0.
///
/// The iteration follows the task across worker threads and is dropped when
/// `fut` completes, so concurrent crawls never see each other's prefix.
pub async fn with_scroll_context<F: Future>(fut: F) -> F::Output {
    SCROLL_ITERATION.scope(Cell::new(0), fut).await
}

/// Sets the scroll iteration for the current crawl task; 0 disables the prefix.
/// Outside [`with_scroll_context`] this does nothing.
pub fn set_scroll_iteration(iteration: u32) {
    let _ = SCROLL_ITERATION.try_with(|v| v.set(iteration));
}

/// Retrieves the scroll iteration for the current crawl task.
/// Returns 0 outside of a crawl.
pub fn scroll_iteration() -> u32 {
    SCROLL_ITERATION.try_with(Cell::get).unwrap_or(0)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __buzz_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::scroll_iteration() {
            0 => $crate::log::$level!($($arg)*),
            n => $crate::log::$level!("[scroll {}] {}", n, format_args!($($arg)*)),
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! buzz_trace {
    ($($arg:tt)*) => {
        $crate::__buzz_log!(trace, $($arg)*)
    };
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! buzz_info {
    ($($arg:tt)*) => {
        $crate::__buzz_log!(info, $($arg)*)
    };
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! buzz_debug {
    ($($arg:tt)*) => {
        $crate::__buzz_log!(debug, $($arg)*)
    };
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! buzz_warn {
    ($($arg:tt)*) => {
        $crate::__buzz_log!(warn, $($arg)*)
    };
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! buzz_error {
    ($($arg:tt)*) => {
        $crate::__buzz_log!(error, $($arg)*)
    };
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_zero_outside_a_crawl() {
        set_scroll_iteration(7);
        assert_eq!(scroll_iteration(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn iteration_follows_its_task() {
        let crawl = |offset: u32| {
            tokio::spawn(with_scroll_context(async move {
                let mut observed = Vec::new();
                for step in 1..=5 {
                    set_scroll_iteration(offset + step);
                    tokio::task::yield_now().await;
                    observed.push(scroll_iteration());
                }
                observed
            }))
        };
        let first = crawl(0);
        let second = crawl(100);

        assert_eq!(first.await.unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(second.await.unwrap(), vec![101, 102, 103, 104, 105]);
        assert_eq!(scroll_iteration(), 0);
    }

    #[tokio::test]
    async fn context_ends_with_its_future() {
        let inside = with_scroll_context(async {
            set_scroll_iteration(4);
            scroll_iteration()
        })
        .await;
        assert_eq!(inside, 4);
        assert_eq!(scroll_iteration(), 0);
    }

    #[tokio::test]
    async fn macros_expand_with_and_without_iteration() {
        initialize_for_tests();
        buzz_info!("outside crawl {}", 1);
        with_scroll_context(async {
            set_scroll_iteration(3);
            buzz_debug!("inside crawl {}", "ok");
            buzz_warn!("plain");
        })
        .await;
    }
}
