use std::sync::Arc;

use log::{debug, info};

use crate::error::{HookError, Result};
use crate::runtime::{Class, Sel};
use crate::types::SignatureKind;

pub mod hook;
pub mod invocation;
pub mod registry;
pub(crate) mod trampoline;

use hook::Hook;
use registry::{HookEntry, HookRegistry};

/// Installs hooks by rewriting class dispatch tables.
///
/// Each `add_instance_method` captures what the selector currently resolves
/// to, records it with the new callable in the registry, and only then
/// points the class's own table slot at the shape's trampoline. Installs on
/// one class are serialised by that class's install lock; installs on
/// different classes proceed independently.
#[derive(Clone)]
pub struct Interceptor {
    registry: Arc<HookRegistry>,
}

impl Interceptor {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Answer `selector` on `class` with `hook`, layering over whatever
    /// answered it before (the class's own method, an ancestor's, or an
    /// earlier hook). Only `class` and its subclasses are affected.
    ///
    /// Hooking the same pair again adds another layer; it is never an error.
    ///
    /// # Safety
    /// `hook.kind()` must be the selector's real calling shape: senders will
    /// call the trampoline, and `invoke_super*` will call the captured
    /// original, through that signature.
    pub unsafe fn add_instance_method(
        &self,
        class: &Class,
        selector: Sel,
        hook: Hook,
    ) -> Result<Arc<HookEntry>> {
        if !Arc::ptr_eq(class.registry(), &self.registry) {
            return Err(HookError::ForeignClass(class.name().to_string()));
        }

        let kind = hook.kind();
        let _install = class.install_lock().lock().unwrap();

        let original = class.resolve(selector);
        let predecessor = original.and_then(|(owner, imp)| {
            SignatureKind::of_trampoline(imp)?;
            owner.registry().get(owner, selector)
        });

        match original {
            Some((owner, imp)) => debug!(
                "-[{} {}]: captured {:?} from {}{}",
                class.name(),
                selector,
                imp,
                owner.name(),
                if predecessor.is_some() { " (hook layer)" } else { "" }
            ),
            None => debug!(
                "-[{} {}]: no prior implementation in hierarchy",
                class.name(),
                selector
            ),
        }

        let entry = Arc::new(HookEntry::new(class, selector, hook, original, predecessor));
        self.registry.publish(Arc::clone(&entry));
        class.set_method(selector, kind.trampoline());

        if self.registry.config().log_installs {
            info!(
                "Hooked -[{} {}] as {} (layer {})",
                class.name(),
                selector,
                kind,
                entry.depth()
            );
        }
        Ok(entry)
    }
}
