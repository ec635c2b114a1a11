//! Invocation of the host C toolchain.

use crate::DriverError;
use std::path::Path;
use std::process::Command;

/// The host C compiler configuration.
pub struct Toolchain {
    /// Compiler command (`cc` unless overridden).
    pub cc: String,
    /// Optimization level passed as `-O{n}`, 0–3.
    pub opt_level: u8,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cc: "cc".to_string(),
            opt_level: 3,
        }
    }
}

impl Toolchain {
    /// Creates a toolchain with an explicit compiler and optimization level.
    pub fn new(cc: impl Into<String>, opt_level: u8) -> Self {
        Self {
            cc: cc.into(),
            opt_level: opt_level.min(3),
        }
    }

    /// Compiles `c_source` into a shared object at `output`.
    pub fn compile(&self, c_source: &Path, output: &Path) -> Result<(), DriverError> {
        let result = Command::new(&self.cc)
            .arg("-shared")
            .arg("-fPIC")
            .arg(format!("-O{}", self.opt_level))
            .arg("-o")
            .arg(output)
            .arg(c_source)
            .output()
            .map_err(|source| DriverError::CompilerLaunch {
                cc: self.cc.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(DriverError::CompilerFailed {
                status: result.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }

    /// Whether the configured compiler can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.cc)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration() {
        let tc = Toolchain::default();
        assert_eq!(tc.cc, "cc");
        assert_eq!(tc.opt_level, 3);
    }

    #[test]
    fn opt_level_is_clamped() {
        let tc = Toolchain::new("gcc", 9);
        assert_eq!(tc.opt_level, 3);
    }

    #[test]
    fn missing_compiler_fails_to_launch() {
        let tc = Toolchain::new("definitely-not-a-compiler", 0);
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("x.c");
        std::fs::write(&src, "int x;").unwrap();
        let err = tc.compile(&src, &dir.path().join("x.so")).unwrap_err();
        assert!(matches!(err, DriverError::CompilerLaunch { .. }));
    }

    #[test]
    fn bad_source_reports_compiler_stderr() {
        let tc = Toolchain::new("cc", 0);
        if !tc.is_available() {
            return; // no host toolchain in this environment
        }
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.c");
        std::fs::write(&src, "this is not C").unwrap();
        let err = tc.compile(&src, &dir.path().join("broken.so")).unwrap_err();
        match err {
            DriverError::CompilerFailed { stderr, .. } => assert!(!stderr.is_empty()),
            other => panic!("expected CompilerFailed, got {other:?}"),
        }
    }
}
