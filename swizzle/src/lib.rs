//! malwi-swizzle: runtime method interception for message-dispatch object runtimes.
//!
//! Attach a replacement implementation to a selector on one class without
//! touching the class's definition, keep the ability to call whatever
//! answered the selector before, and reflect on ivars and entry points.

pub mod config;
pub mod error;
pub mod interceptor;
mod reflect;
pub mod runtime;
pub mod thread;
pub mod types;

// Public surface, flattened.
pub use config::SwizzleConfig;
pub use error::{HookError, Result};
pub use interceptor::hook::Hook;
pub use interceptor::registry::{HookEntry, HookKey, HookRegistry};
pub use interceptor::Interceptor;
pub use runtime::{Class, ClassRef, IvarKind, IvarValue, Object, ObjectRef, Runtime, Sel};
pub use types::{Imp, Point, Rect, SignatureKind, Size};
