use core::ffi::c_void;
use core::fmt;
use core::ptr::NonNull;

use crate::interceptor::trampoline;
use crate::runtime::{Object, Sel};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Geometry argument of the `RectArg` shape. Layout-identical to `CGRect` on
/// 64-bit targets, so it is passed by value in the same registers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }
}

// Native implementation signatures, one per supported shape. The receiver and
// selector always occupy the first two argument slots.
pub type VoidImp = unsafe extern "C" fn(*const Object, Sel);
pub type RectArgImp = unsafe extern "C" fn(*const Object, Sel, Rect);
pub type FloatImp = unsafe extern "C" fn(*const Object, Sel) -> f64;
pub type BoolImp = unsafe extern "C" fn(*const Object, Sel) -> bool;
pub type BoolArgBoolImp = unsafe extern "C" fn(*const Object, Sel, bool) -> bool;

/// Raw entry point bound to a selector in a dispatch table.
///
/// An `Imp` carries no shape; reinterpreting it as one of the typed
/// signatures is the caller's responsibility.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Imp(NonNull<c_void>);

// Entry points are code addresses; sharing them between threads is fine.
unsafe impl Send for Imp {}
unsafe impl Sync for Imp {}

macro_rules! imp_shape {
    ($ctor:ident, $cast:ident, $ty:ty) => {
        pub fn $ctor(f: $ty) -> Self {
            // SAFETY: function pointers are never null.
            Imp(unsafe { NonNull::new_unchecked(f as *mut c_void) })
        }

        /// # Safety
        /// The entry point must really have this signature.
        #[inline]
        pub unsafe fn $cast(self) -> $ty {
            core::mem::transmute::<*const c_void, $ty>(self.0.as_ptr() as *const c_void)
        }
    };
}

impl Imp {
    imp_shape!(void, as_void, VoidImp);
    imp_shape!(rect_arg, as_rect_arg, RectArgImp);
    imp_shape!(returns_float, as_returns_float, FloatImp);
    imp_shape!(returns_bool, as_returns_bool, BoolImp);
    imp_shape!(bool_arg_returns_bool, as_bool_arg_returns_bool, BoolArgBoolImp);

    /// # Safety
    /// `ptr` must be null or the address of a function.
    pub unsafe fn from_raw(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Imp)
    }

    #[inline]
    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }

    #[inline]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for Imp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imp({:#x})", self.addr())
    }
}

/// The closed set of calling shapes the interceptor can trampoline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureKind {
    /// `- (void)sel`
    Void,
    /// `- (void)sel:(Rect)rect`
    RectArg,
    /// `- (double)sel`
    ReturnsFloat,
    /// `- (bool)sel`
    ReturnsBool,
    /// `- (bool)sel:(bool)arg`
    BoolArgReturnsBool,
}

impl SignatureKind {
    pub const ALL: [SignatureKind; 5] = [
        SignatureKind::Void,
        SignatureKind::RectArg,
        SignatureKind::ReturnsFloat,
        SignatureKind::ReturnsBool,
        SignatureKind::BoolArgReturnsBool,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SignatureKind::Void => "void",
            SignatureKind::RectArg => "rect-arg",
            SignatureKind::ReturnsFloat => "returns-float",
            SignatureKind::ReturnsBool => "returns-bool",
            SignatureKind::BoolArgReturnsBool => "bool-arg-returns-bool",
        }
    }

    /// Type encoding of the native shape.
    pub fn encoding(self) -> &'static str {
        match self {
            SignatureKind::Void => "v@:",
            SignatureKind::RectArg => "v@:{CGRect={CGPoint=dd}{CGSize=dd}}",
            SignatureKind::ReturnsFloat => "d@:",
            SignatureKind::ReturnsBool => "B@:",
            SignatureKind::BoolArgReturnsBool => "B@:B",
        }
    }

    /// The fixed entry point installed for hooks of this shape.
    pub fn trampoline(self) -> Imp {
        match self {
            SignatureKind::Void => Imp::void(trampoline::void_trampoline),
            SignatureKind::RectArg => Imp::rect_arg(trampoline::rect_arg_trampoline),
            SignatureKind::ReturnsFloat => Imp::returns_float(trampoline::returns_float_trampoline),
            SignatureKind::ReturnsBool => Imp::returns_bool(trampoline::returns_bool_trampoline),
            SignatureKind::BoolArgReturnsBool => {
                Imp::bool_arg_returns_bool(trampoline::bool_arg_returns_bool_trampoline)
            }
        }
    }

    /// Which shape's trampoline `imp` is, if it is one of ours.
    pub fn of_trampoline(imp: Imp) -> Option<SignatureKind> {
        Self::ALL.into_iter().find(|kind| kind.trampoline() == imp)
    }
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoding())
    }
}
