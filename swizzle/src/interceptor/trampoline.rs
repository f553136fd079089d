//! Fixed native entry points, one per [`SignatureKind`].
//!
//! A hooked selector's dispatch-table slot points at the trampoline for its
//! shape. Callers reach it through an ordinary typed send and cannot tell it
//! from a native implementation: the receiver, `_cmd` and the typed argument
//! arrive in the registers the native signature uses, and the result leaves
//! the same way.
//!
//! The trampoline walks from the receiver's class to the first class whose
//! own table binds the selector to this trampoline and that has a registry
//! entry, then runs that entry's callable. Classes that bind the selector to
//! a native implementation are skipped: the call reached an ancestor's
//! trampoline because the native code called up directly.
//!
//! A hook callable that panics aborts the process, as any unwind out of an
//! `extern "C"` function does.

use std::sync::Arc;

use log::{trace, warn};

use crate::interceptor::invocation;
use crate::interceptor::registry::HookEntry;
use crate::runtime::{Object, Sel};
use crate::thread;
use crate::types::{Rect, SignatureKind};

fn dispatch(receiver: &Object, selector: Sel, kind: SignatureKind) -> Option<Arc<HookEntry>> {
    let trampoline = kind.trampoline();
    let found = receiver.class().chain().find_map(|class| {
        if class.own_method(selector)? != trampoline {
            return None;
        }
        class.registry().get(class, selector)
    });

    match &found {
        Some(entry) => {
            if tracing_enabled(receiver) {
                trace!(
                    "[{}] -[{} {}] -> {} layer {} ({})",
                    thread::current(),
                    receiver.class().name(),
                    selector,
                    entry.class_name(),
                    entry.depth(),
                    kind.name()
                );
            }
        }
        None => warn!(
            "-[{} {}]: {} trampoline reached with no hook recorded; returning default",
            receiver.class().name(),
            selector,
            kind.name()
        ),
    }
    found
}

fn tracing_enabled(receiver: &Object) -> bool {
    receiver.class().registry().config().trace_dispatch
}

/// `(self, _cmd)`
pub(crate) unsafe extern "C" fn void_trampoline(receiver: *const Object, selector: Sel) {
    let Some(receiver) = receiver.as_ref() else {
        return;
    };
    if let Some(entry) = dispatch(receiver, selector, SignatureKind::Void) {
        invocation::call_void(&entry, receiver)
    }
}

/// `(self, _cmd, Rect)`
pub(crate) unsafe extern "C" fn rect_arg_trampoline(
    receiver: *const Object,
    selector: Sel,
    rect: Rect,
) {
    let Some(receiver) = receiver.as_ref() else {
        return;
    };
    if let Some(entry) = dispatch(receiver, selector, SignatureKind::RectArg) {
        invocation::call_rect_arg(&entry, receiver, rect)
    }
}

/// `(self, _cmd) -> f64`
pub(crate) unsafe extern "C" fn returns_float_trampoline(
    receiver: *const Object,
    selector: Sel,
) -> f64 {
    let Some(receiver) = receiver.as_ref() else {
        return 0.0;
    };
    match dispatch(receiver, selector, SignatureKind::ReturnsFloat) {
        Some(entry) => invocation::call_returns_float(&entry, receiver),
        None => 0.0,
    }
}

/// `(self, _cmd) -> bool`
pub(crate) unsafe extern "C" fn returns_bool_trampoline(
    receiver: *const Object,
    selector: Sel,
) -> bool {
    let Some(receiver) = receiver.as_ref() else {
        return false;
    };
    match dispatch(receiver, selector, SignatureKind::ReturnsBool) {
        Some(entry) => invocation::call_returns_bool(&entry, receiver),
        None => false,
    }
}

/// `(self, _cmd, bool) -> bool`
pub(crate) unsafe extern "C" fn bool_arg_returns_bool_trampoline(
    receiver: *const Object,
    selector: Sel,
    arg: bool,
) -> bool {
    let Some(receiver) = receiver.as_ref() else {
        return false;
    };
    match dispatch(receiver, selector, SignatureKind::BoolArgReturnsBool) {
        Some(entry) => invocation::call_bool_arg_returns_bool(&entry, receiver, arg),
        None => false,
    }
}
