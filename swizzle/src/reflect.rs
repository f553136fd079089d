//! Reflection on live objects: ivars by name and current entry points.

use crate::runtime::{IvarValue, Object, ObjectRef, Sel};
use crate::types::Imp;

impl Object {
    /// The object stored in ivar `name`, declared on the receiver's class or
    /// an ancestor.
    ///
    /// Returns the stored reference itself, so `Arc::ptr_eq` against the
    /// field's value holds. `None` if no such ivar exists, it is not
    /// object-typed, or it holds nil.
    pub fn object_ivar(&self, name: &str) -> Option<ObjectRef> {
        let ivar = self.class().ivar(name)?;
        match &*self.slot(ivar).read().unwrap() {
            IvarValue::Object(value) => value.clone(),
            _ => None,
        }
    }

    /// Entry point ordinary dispatch currently reaches for `selector`, hook
    /// trampolines included. Invoking it with the right shape is up to the
    /// caller.
    pub fn implementation_for_selector(&self, selector: Sel) -> Option<Imp> {
        self.class().instance_method(selector)
    }
}
