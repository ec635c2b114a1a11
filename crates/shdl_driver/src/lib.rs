//! Driver glue: turning emitted C into a loaded, callable simulator.
//!
//! [`Toolchain`] invokes the host C compiler with `-shared -fPIC -O{n}`;
//! [`Circuit`] loads the resulting shared object and exposes safe wrappers
//! over the four FFI symbols (`reset`, `poke`, `peek`, `step`, plus the
//! emitted `eval`). The loaded library stays alive as long as the `Circuit`
//! that owns it.
//!
//! The simulator instance inside the shared object is process-wide and not
//! re-entrant; concurrent `poke`/`step` calls need an external mutex.

#![warn(missing_docs)]

mod circuit;
mod toolchain;

pub use circuit::Circuit;
pub use toolchain::Toolchain;

/// Errors from toolchain invocation or simulator loading.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The C compiler could not be launched at all.
    #[error("failed to launch C compiler '{cc}': {source}")]
    CompilerLaunch {
        /// The compiler command.
        cc: String,
        /// The underlying OS error.
        source: std::io::Error,
    },
    /// The C compiler ran and reported failure.
    #[error("C compilation failed (exit {status}):\n{stderr}")]
    CompilerFailed {
        /// The compiler's exit code, or -1 when terminated by a signal.
        status: i32,
        /// Captured compiler stderr.
        stderr: String,
    },
    /// The shared object could not be loaded or a symbol was missing.
    #[error("failed to load simulator library: {0}")]
    Load(#[from] libloading::Error),
    /// A signal name contained an interior NUL byte.
    #[error("signal name contains a NUL byte")]
    BadSignalName,
}
