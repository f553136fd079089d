//! OS thread tags for dispatch trace lines.

use std::fmt;

/// Native id of a thread, printed in hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadTag(u64);

impl ThreadTag {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Tag of the calling thread (`pthread_self`).
#[cfg(unix)]
pub fn current() -> ThreadTag {
    ThreadTag(unsafe { libc::pthread_self() } as u64)
}

/// Tag of the calling thread (`GetCurrentThreadId`).
#[cfg(windows)]
pub fn current() -> ThreadTag {
    ThreadTag(unsafe { windows_sys::Win32::System::Threading::GetCurrentThreadId() } as u64)
}
