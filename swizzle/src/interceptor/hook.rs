use std::fmt;
use std::sync::Arc;

use crate::runtime::Object;
use crate::types::{Rect, SignatureKind};

pub type VoidFn = dyn Fn(&Object) + Send + Sync;
pub type RectArgFn = dyn Fn(&Object, Rect) + Send + Sync;
pub type FloatFn = dyn Fn(&Object) -> f64 + Send + Sync;
pub type BoolFn = dyn Fn(&Object) -> bool + Send + Sync;
pub type BoolArgBoolFn = dyn Fn(&Object, bool) -> bool + Send + Sync;

/// A replacement implementation, tagged with its calling shape.
///
/// The variant is the signature the selector is installed with, so the
/// callable and the trampoline it is reached through always agree.
#[derive(Clone)]
pub enum Hook {
    Void(Arc<VoidFn>),
    RectArg(Arc<RectArgFn>),
    ReturnsFloat(Arc<FloatFn>),
    ReturnsBool(Arc<BoolFn>),
    BoolArgReturnsBool(Arc<BoolArgBoolFn>),
}

impl Hook {
    pub fn void(f: impl Fn(&Object) + Send + Sync + 'static) -> Self {
        Hook::Void(Arc::new(f))
    }

    pub fn rect_arg(f: impl Fn(&Object, Rect) + Send + Sync + 'static) -> Self {
        Hook::RectArg(Arc::new(f))
    }

    pub fn returns_float(f: impl Fn(&Object) -> f64 + Send + Sync + 'static) -> Self {
        Hook::ReturnsFloat(Arc::new(f))
    }

    pub fn returns_bool(f: impl Fn(&Object) -> bool + Send + Sync + 'static) -> Self {
        Hook::ReturnsBool(Arc::new(f))
    }

    pub fn bool_arg_returns_bool(f: impl Fn(&Object, bool) -> bool + Send + Sync + 'static) -> Self {
        Hook::BoolArgReturnsBool(Arc::new(f))
    }

    pub fn kind(&self) -> SignatureKind {
        match self {
            Hook::Void(_) => SignatureKind::Void,
            Hook::RectArg(_) => SignatureKind::RectArg,
            Hook::ReturnsFloat(_) => SignatureKind::ReturnsFloat,
            Hook::ReturnsBool(_) => SignatureKind::ReturnsBool,
            Hook::BoolArgReturnsBool(_) => SignatureKind::BoolArgReturnsBool,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.kind().name())
    }
}
