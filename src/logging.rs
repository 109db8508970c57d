//! Logging initialization for the `fs_shell` and `fs_mkfs` binaries.
//!
//! The core itself never initializes a logger — it only emits `log::*`
//! records — so library consumers (including the test suite) can install
//! whatever subscriber they want. This module exists purely for the
//! executables shipped alongside the library.

/// Install `env_logger` as the global logger, honoring `RUST_LOG` if set and
/// defaulting to `info` otherwise.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
