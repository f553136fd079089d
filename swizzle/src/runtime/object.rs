//! Instances and their ivar storage.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{HookError, Result};
use crate::runtime::class::{ClassRef, Ivar, IvarKind};
use crate::runtime::Class;

pub type ObjectRef = Arc<Object>;

/// Value held in one ivar slot.
#[derive(Debug, Clone)]
pub enum IvarValue {
    Object(Option<ObjectRef>),
    Bool(bool),
    Float(f64),
    Int(i64),
}

impl IvarValue {
    fn zeroed(kind: IvarKind) -> Self {
        match kind {
            IvarKind::Object => IvarValue::Object(None),
            IvarKind::Bool => IvarValue::Bool(false),
            IvarKind::Float => IvarValue::Float(0.0),
            IvarKind::Int => IvarValue::Int(0),
        }
    }

    pub fn kind(&self) -> IvarKind {
        match self {
            IvarValue::Object(_) => IvarKind::Object,
            IvarValue::Bool(_) => IvarKind::Bool,
            IvarValue::Float(_) => IvarKind::Float,
            IvarValue::Int(_) => IvarKind::Int,
        }
    }
}

/// A live instance. The isa is fixed at allocation; ivar slots follow the
/// class's layout and start zeroed.
pub struct Object {
    class: ClassRef,
    slots: Box<[RwLock<IvarValue>]>,
}

impl Object {
    pub fn new(class: &ClassRef) -> ObjectRef {
        let slots = class
            .ivar_layout()
            .into_iter()
            .map(|ivar| RwLock::new(IvarValue::zeroed(ivar.kind())))
            .collect();
        Arc::new(Object {
            class: Arc::clone(class),
            slots,
        })
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn is_kind_of(&self, class: &Class) -> bool {
        self.class.is_subclass_of(class)
    }

    pub fn as_ptr(&self) -> *const Object {
        self as *const Object
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        std::ptr::eq(a, b)
    }

    pub(crate) fn slot(&self, ivar: &Ivar) -> &RwLock<IvarValue> {
        &self.slots[ivar.index()]
    }

    fn lookup_ivar(&self, name: &str) -> Result<&Ivar> {
        self.class.ivar(name).ok_or_else(|| HookError::IvarUnresolved {
            class: self.class.name().to_string(),
            name: name.to_string(),
        })
    }

    pub fn ivar_value(&self, name: &str) -> Result<IvarValue> {
        let ivar = self.lookup_ivar(name)?;
        Ok(self.slot(ivar).read().unwrap().clone())
    }

    /// Store `value`; its kind must match the declared ivar kind.
    pub fn set_ivar(&self, name: &str, value: IvarValue) -> Result<()> {
        let ivar = self.lookup_ivar(name)?;
        if ivar.kind() != value.kind() {
            return Err(HookError::IvarKindMismatch {
                name: name.to_string(),
                expected: ivar.kind(),
                found: value.kind(),
            });
        }
        *self.slot(ivar).write().unwrap() = value;
        Ok(())
    }

    pub fn set_object_ivar(&self, name: &str, value: Option<ObjectRef>) -> Result<()> {
        self.set_ivar(name, IvarValue::Object(value))
    }

    pub fn set_bool_ivar(&self, name: &str, value: bool) -> Result<()> {
        self.set_ivar(name, IvarValue::Bool(value))
    }

    pub fn set_float_ivar(&self, name: &str, value: f64) -> Result<()> {
        self.set_ivar(name, IvarValue::Float(value))
    }

    pub fn set_int_ivar(&self, name: &str, value: i64) -> Result<()> {
        self.set_ivar(name, IvarValue::Int(value))
    }

    pub fn bool_ivar(&self, name: &str) -> Result<bool> {
        match self.ivar_value(name)? {
            IvarValue::Bool(v) => Ok(v),
            other => Err(self.kind_mismatch(name, IvarKind::Bool, &other)),
        }
    }

    pub fn float_ivar(&self, name: &str) -> Result<f64> {
        match self.ivar_value(name)? {
            IvarValue::Float(v) => Ok(v),
            other => Err(self.kind_mismatch(name, IvarKind::Float, &other)),
        }
    }

    pub fn int_ivar(&self, name: &str) -> Result<i64> {
        match self.ivar_value(name)? {
            IvarValue::Int(v) => Ok(v),
            other => Err(self.kind_mismatch(name, IvarKind::Int, &other)),
        }
    }

    fn kind_mismatch(&self, name: &str, expected: IvarKind, found: &IvarValue) -> HookError {
        HookError::IvarKindMismatch {
            name: name.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {:p}>", self.class.name(), self)
    }
}
