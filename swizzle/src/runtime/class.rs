//! Classes, their ivar layout and their dispatch tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{HookError, Result};
use crate::interceptor::registry::HookRegistry;
use crate::runtime::{Runtime, Sel};
use crate::types::Imp;

pub type ClassRef = Arc<Class>;

/// Class identity, stable for the lifetime of the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvarKind {
    Object,
    Bool,
    Float,
    Int,
}

impl fmt::Display for IvarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IvarKind::Object => "object",
            IvarKind::Bool => "bool",
            IvarKind::Float => "float",
            IvarKind::Int => "int",
        };
        f.write_str(name)
    }
}

/// An instance variable declared by some class in a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ivar {
    name: String,
    kind: IvarKind,
    index: usize,
    declared_by: String,
}

impl Ivar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IvarKind {
        self.kind
    }

    /// Slot index in instances of the declaring class and its subclasses.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn declared_by(&self) -> &str {
        &self.declared_by
    }
}

pub struct Class {
    name: String,
    superclass: Option<ClassRef>,
    /// Own ivars only; slot indices continue after the superclass's.
    ivars: Vec<Ivar>,
    instance_size: usize,
    /// Own dispatch table. Inherited selectors are found by walking up.
    methods: RwLock<HashMap<Sel, Imp>>,
    /// Serialises hook installation on this class.
    install_lock: Mutex<()>,
    registry: Arc<HookRegistry>,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    pub fn id(&self) -> ClassId {
        ClassId(self as *const Class as usize)
    }

    /// This class followed by its ancestors, nearest first.
    pub fn chain(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |c| c.superclass.as_deref())
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.chain().any(|c| std::ptr::eq(c, other))
    }

    /// Entry point bound to `sel` in this class's own table.
    pub fn own_method(&self, sel: Sel) -> Option<Imp> {
        self.methods.read().unwrap().get(&sel).copied()
    }

    pub fn defines(&self, sel: Sel) -> bool {
        self.own_method(sel).is_some()
    }

    /// Ordinary resolution: self, then ancestors. Also reports which class
    /// answered.
    pub fn resolve(&self, sel: Sel) -> Option<(&Class, Imp)> {
        self.chain()
            .find_map(|c| c.own_method(sel).map(|imp| (c, imp)))
    }

    pub fn instance_method(&self, sel: Sel) -> Option<Imp> {
        self.resolve(sel).map(|(_, imp)| imp)
    }

    pub fn responds_to(&self, sel: Sel) -> bool {
        self.resolve(sel).is_some()
    }

    /// Ivar lookup by name, walking ancestors. A subclass ivar shadows an
    /// ancestor's of the same name.
    pub fn ivar(&self, name: &str) -> Option<&Ivar> {
        self.chain()
            .find_map(|c| c.ivars.iter().find(|ivar| ivar.name == name))
    }

    /// Number of ivar slots in an instance, ancestors included.
    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    /// Layout of every slot, in slot order.
    pub fn ivar_layout(&self) -> Vec<&Ivar> {
        let mut chain: Vec<&Class> = self.chain().collect();
        chain.reverse();
        chain.into_iter().flat_map(|c| c.ivars.iter()).collect()
    }

    /// Bind `sel` in this class's own table, returning the previous binding.
    pub(crate) fn set_method(&self, sel: Sel, imp: Imp) -> Option<Imp> {
        self.methods.write().unwrap().insert(sel, imp)
    }

    pub(crate) fn install_lock(&self) -> &Mutex<()> {
        &self.install_lock
    }

    pub(crate) fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|c| c.name()))
            .field("ivars", &self.ivars.len())
            .field("methods", &self.methods.read().unwrap().len())
            .finish()
    }
}

/// Declares a class, then registers it with its runtime.
pub struct ClassBuilder<'rt> {
    runtime: &'rt Runtime,
    name: String,
    superclass: Option<ClassRef>,
    ivars: Vec<(String, IvarKind)>,
    methods: Vec<(Sel, Imp)>,
}

impl<'rt> ClassBuilder<'rt> {
    pub(crate) fn new(runtime: &'rt Runtime, name: &str, superclass: Option<ClassRef>) -> Self {
        Self {
            runtime,
            name: name.to_string(),
            superclass,
            ivars: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn ivar(mut self, name: &str, kind: IvarKind) -> Self {
        self.ivars.push((name.to_string(), kind));
        self
    }

    pub fn method(mut self, sel: impl Into<Sel>, imp: Imp) -> Self {
        self.methods.push((sel.into(), imp));
        self
    }

    pub fn register(self) -> Result<ClassRef> {
        let registry = Arc::clone(self.runtime.registry());
        if let Some(superclass) = &self.superclass {
            if !Arc::ptr_eq(superclass.registry(), &registry) {
                return Err(HookError::ForeignClass(superclass.name().to_string()));
            }
        }

        let base = self.superclass.as_ref().map_or(0, |c| c.instance_size());
        let mut ivars: Vec<Ivar> = Vec::with_capacity(self.ivars.len());
        for (name, kind) in self.ivars {
            if ivars.iter().any(|ivar| ivar.name == name) {
                return Err(HookError::DuplicateIvar {
                    class: self.name,
                    name,
                });
            }
            ivars.push(Ivar {
                name,
                kind,
                index: base + ivars.len(),
                declared_by: self.name.clone(),
            });
        }

        let class = Arc::new(Class {
            instance_size: base + ivars.len(),
            name: self.name,
            superclass: self.superclass,
            ivars,
            methods: RwLock::new(self.methods.into_iter().collect()),
            install_lock: Mutex::new(()),
            registry,
        });
        self.runtime.register_class(class)
    }
}
