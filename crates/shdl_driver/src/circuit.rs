//! The loaded simulator and its FFI surface.

use crate::DriverError;
use libloading::{Library, Symbol};
use std::ffi::CString;
use std::os::raw::c_char;
use std::path::Path;

type ResetFn = unsafe extern "C" fn();
type PokeFn = unsafe extern "C" fn(*const c_char, u64);
type PeekFn = unsafe extern "C" fn(*const c_char) -> u64;
type StepFn = unsafe extern "C" fn(i32);
type EvalFn = unsafe extern "C" fn();

/// A compiled simulator loaded from a shared object.
///
/// Owns the library; the function pointers stay valid for the circuit's
/// lifetime and the library unloads on drop.
#[derive(Debug)]
pub struct Circuit {
    /// Kept alive for the function pointers' sake.
    _library: Library,
    reset: ResetFn,
    poke: PokeFn,
    peek: PeekFn,
    step: StepFn,
    eval: EvalFn,
}

impl Circuit {
    /// Loads a simulator shared object and resolves its symbols.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        // SAFETY: the library is an artifact we just produced with the shdlc
        // pipeline; its initializers are trivial.
        let library = unsafe { Library::new(path) }?;
        let (reset, poke, peek, step, eval) = unsafe {
            let reset: Symbol<'_, ResetFn> = library.get(b"reset\0")?;
            let poke: Symbol<'_, PokeFn> = library.get(b"poke\0")?;
            let peek: Symbol<'_, PeekFn> = library.get(b"peek\0")?;
            let step: Symbol<'_, StepFn> = library.get(b"step\0")?;
            let eval: Symbol<'_, EvalFn> = library.get(b"eval\0")?;
            (*reset, *poke, *peek, *step, *eval)
        };
        Ok(Self {
            _library: library,
            reset,
            poke,
            peek,
            step,
            eval,
        })
    }

    /// Zeroes the simulator state and cached inputs.
    pub fn reset(&self) {
        unsafe { (self.reset)() }
    }

    /// Writes an input port; the simulator masks to the port width.
    pub fn poke(&self, name: &str, value: u64) -> Result<(), DriverError> {
        let name = CString::new(name).map_err(|_| DriverError::BadSignalName)?;
        unsafe { (self.poke)(name.as_ptr(), value) };
        Ok(())
    }

    /// Reads an input port, output port, or internal chunk word. Unknown
    /// names read as 0 (the simulator prints a diagnostic to stderr).
    pub fn peek(&self, name: &str) -> Result<u64, DriverError> {
        let name = CString::new(name).map_err(|_| DriverError::BadSignalName)?;
        Ok(unsafe { (self.peek)(name.as_ptr()) })
    }

    /// Advances `cycles` ticks.
    pub fn step(&self, cycles: i32) {
        unsafe { (self.step)(cycles) }
    }

    /// Computes the pending next state without committing it.
    pub fn eval(&self) {
        unsafe { (self.eval)() }
    }
}
