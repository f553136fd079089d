//! Host object runtime: classes, objects, selectors and message send.
//!
//! The interceptor patches dispatch tables owned by this runtime. A `Runtime`
//! is constructed explicitly and owns the one `HookRegistry` its classes
//! route hooked selectors through; classes and the registry live as long as
//! the runtime (in practice, the process).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::SwizzleConfig;
use crate::interceptor::registry::HookRegistry;
use crate::interceptor::Interceptor;

pub mod class;
pub mod object;
pub mod selector;
mod send;

pub use class::{Class, ClassBuilder, ClassId, ClassRef, Ivar, IvarKind};
pub use object::{IvarValue, Object, ObjectRef};
pub use selector::Sel;

pub struct Runtime {
    classes: RwLock<HashMap<String, ClassRef>>,
    registry: Arc<HookRegistry>,
}

impl Runtime {
    /// Runtime configured from `MALWI_SWIZZLE_TRACE` / `MALWI_SWIZZLE_QUIET`.
    pub fn new() -> Self {
        Self::with_config(SwizzleConfig::from_env())
    }

    pub fn with_config(config: SwizzleConfig) -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
            registry: Arc::new(HookRegistry::with_config(config)),
        }
    }

    /// Start declaring a class. Nothing is visible until
    /// [`ClassBuilder::register`].
    pub fn define_class(&self, name: &str, superclass: Option<&ClassRef>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name, superclass.cloned())
    }

    pub fn class_named(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().unwrap().get(name).cloned()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().unwrap().len()
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Installer bound to this runtime's registry.
    pub fn interceptor(&self) -> Interceptor {
        Interceptor::new(Arc::clone(&self.registry))
    }

    pub fn config(&self) -> &SwizzleConfig {
        self.registry.config()
    }

    /// Insert a freshly built class; fails if the name is taken.
    pub(crate) fn register_class(&self, class: ClassRef) -> crate::error::Result<ClassRef> {
        let mut classes = self.classes.write().unwrap();
        if classes.contains_key(class.name()) {
            return Err(crate::error::HookError::DuplicateClass(class.name().to_string()));
        }
        classes.insert(class.name().to_string(), Arc::clone(&class));
        log::debug!("Registered class {}", class.name());
        Ok(class)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
