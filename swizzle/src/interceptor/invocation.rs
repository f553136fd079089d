//! Running hook layers and calling "super".
//!
//! Every time a hook callable runs, a frame (receiver, selector, entry) is
//! pushed on a thread-local stack and popped when the callable returns or
//! unwinds. `invoke_super*` uses the innermost frame for the same receiver
//! and selector to find the layer that is calling, and continues exactly one
//! layer below it:
//!
//! 1. the predecessor entry's callable, when the captured original was a
//!    hook trampoline;
//! 2. otherwise the captured native original, through its typed signature;
//! 3. otherwise a fixed default: no-op, `false` or `0.0`.
//!
//! Called outside any hook, `invoke_super*` starts below the entry that
//! ordinary dispatch currently reaches for the receiver. When dispatch
//! reaches no hook, it resolves the selector from the receiver's superclass
//! instead, the way a message to `super` from the receiver's own class does.

use std::cell::RefCell;
use std::sync::Arc;

use log::warn;

use crate::interceptor::hook::Hook;
use crate::interceptor::registry::HookEntry;
use crate::runtime::{Object, Sel};
use crate::types::{Imp, Rect, SignatureKind};

struct Frame {
    receiver: usize,
    selector: Sel,
    entry: Arc<HookEntry>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a frame on the stack for its lifetime.
struct FrameGuard;

impl FrameGuard {
    fn push(receiver: &Object, entry: &Arc<HookEntry>) -> Self {
        FRAMES.with(|frames| {
            frames.borrow_mut().push(Frame {
                receiver: receiver.as_ptr() as usize,
                selector: entry.selector(),
                entry: Arc::clone(entry),
            })
        });
        FrameGuard
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Number of hook layers currently executing on this thread.
pub fn active_depth() -> usize {
    FRAMES.with(|frames| frames.borrow().len())
}

fn innermost_frame(receiver: &Object, selector: Sel) -> Option<Arc<HookEntry>> {
    let receiver = receiver.as_ptr() as usize;
    FRAMES.with(|frames| {
        frames
            .borrow()
            .iter()
            .rev()
            .find(|f| f.receiver == receiver && f.selector == selector)
            .map(|f| Arc::clone(&f.entry))
    })
}

/// The entry ordinary dispatch reaches for `receiver`, if that is a hook.
pub(crate) fn reached_entry(receiver: &Object, selector: Sel) -> Option<Arc<HookEntry>> {
    let (owner, imp) = receiver.class().resolve(selector)?;
    SignatureKind::of_trampoline(imp)?;
    owner.registry().get(owner, selector)
}

fn calling_entry(receiver: &Object, selector: Sel) -> Option<Arc<HookEntry>> {
    innermost_frame(receiver, selector).or_else(|| reached_entry(receiver, selector))
}

enum Below {
    Layer(Arc<HookEntry>),
    Native(Imp),
    Absent,
}

fn below(entry: &HookEntry) -> Below {
    if let Some(predecessor) = entry.predecessor() {
        return Below::Layer(Arc::clone(predecessor));
    }
    match entry.original() {
        Some(imp) if SignatureKind::of_trampoline(imp).is_none() => Below::Native(imp),
        Some(imp) => {
            // A trampoline with no entry behind it would route straight back
            // into the receiver's newest layer.
            warn!(
                "-[{} {}]: original {:?} is a trampoline with no recorded layer; treating as absent",
                entry.class_name(),
                entry.selector(),
                imp
            );
            Below::Absent
        }
        None => Below::Absent,
    }
}

/// Outside any hook: what the receiver's superclass answers for `selector`.
fn inherited(receiver: &Object, selector: Sel) -> Below {
    let Some((owner, imp)) = receiver
        .class()
        .superclass()
        .and_then(|superclass| superclass.resolve(selector))
    else {
        return Below::Absent;
    };
    if SignatureKind::of_trampoline(imp).is_none() {
        return Below::Native(imp);
    }
    match owner.registry().get(owner, selector) {
        Some(entry) => Below::Layer(entry),
        None => {
            warn!(
                "-[{} {}]: inherited trampoline has no recorded layer; treating as absent",
                owner.name(),
                selector
            );
            Below::Absent
        }
    }
}

fn shape_mismatch(entry: &HookEntry, requested: SignatureKind) {
    warn!(
        "-[{} {}] is hooked as {} but was invoked as {}; returning default",
        entry.class_name(),
        entry.selector(),
        entry.signature().name(),
        requested.name()
    );
}

// Generates, for one shape:
// - `$call`: run an entry's callable with a frame pushed;
// - `$sup`: run the layer below the calling entry. Unsafe: a native
//   implementation below is called through this shape's signature.
macro_rules! shape {
    (
        $call:ident, $sup:ident, $variant:ident, $cast:ident,
        ($($arg:ident: $ty:ty),*) -> $ret:ty = $default:expr
    ) => {
        pub(crate) fn $call(entry: &Arc<HookEntry>, receiver: &Object $(, $arg: $ty)*) -> $ret {
            match entry.hook() {
                Hook::$variant(f) => {
                    let _frame = FrameGuard::push(receiver, entry);
                    f(receiver $(, $arg)*)
                }
                _ => {
                    shape_mismatch(entry, SignatureKind::$variant);
                    $default
                }
            }
        }

        pub(crate) unsafe fn $sup(receiver: &Object, selector: Sel $(, $arg: $ty)*) -> $ret {
            let next = match calling_entry(receiver, selector) {
                Some(entry) => {
                    if entry.signature() != SignatureKind::$variant {
                        shape_mismatch(&entry, SignatureKind::$variant);
                        return $default;
                    }
                    below(&entry)
                }
                None => inherited(receiver, selector),
            };
            match next {
                Below::Layer(layer) => $call(&layer, receiver $(, $arg)*),
                Below::Native(imp) => imp.$cast()(receiver.as_ptr(), selector $(, $arg)*),
                Below::Absent => $default,
            }
        }
    };
}

shape!(call_void, super_void, Void, as_void, () -> () = ());
shape!(call_rect_arg, super_rect_arg, RectArg, as_rect_arg, (rect: Rect) -> () = ());
shape!(call_returns_float, super_returns_float, ReturnsFloat, as_returns_float, () -> f64 = 0.0);
shape!(call_returns_bool, super_returns_bool, ReturnsBool, as_returns_bool, () -> bool = false);
shape!(
    call_bool_arg_returns_bool,
    super_bool_arg_returns_bool,
    BoolArgReturnsBool,
    as_bool_arg_returns_bool,
    (arg: bool) -> bool = false
);

impl Object {
    /// Call the implementation one layer below the calling hook, or the
    /// superclass's implementation when no hook is running for this
    /// receiver and selector. No-op when there is none.
    ///
    /// # Safety
    /// Whatever answers below must have the `(self, _cmd)` shape. A layer
    /// recorded with another shape is caught and yields the default; a
    /// native implementation is not checked.
    pub unsafe fn invoke_super(&self, selector: Sel) {
        super_void(self, selector)
    }

    /// # Safety
    /// As [`Object::invoke_super`], for the `(self, _cmd, Rect)` shape.
    pub unsafe fn invoke_super_with_rect(&self, selector: Sel, rect: Rect) {
        super_rect_arg(self, selector, rect)
    }

    /// `0.0` when there is no implementation below.
    ///
    /// # Safety
    /// As [`Object::invoke_super`], for the `(self, _cmd) -> f64` shape.
    pub unsafe fn invoke_super_returns_float(&self, selector: Sel) -> f64 {
        super_returns_float(self, selector)
    }

    /// `false` when there is no implementation below.
    ///
    /// # Safety
    /// As [`Object::invoke_super`], for the `(self, _cmd) -> bool` shape.
    pub unsafe fn invoke_super_returns_bool(&self, selector: Sel) -> bool {
        super_returns_bool(self, selector)
    }

    /// `false` when there is no implementation below.
    ///
    /// # Safety
    /// As [`Object::invoke_super`], for the `(self, _cmd, bool) -> bool`
    /// shape.
    pub unsafe fn invoke_super_with_bool_returns_bool(&self, selector: Sel, arg: bool) -> bool {
        super_bool_arg_returns_bool(self, selector, arg)
    }
}
