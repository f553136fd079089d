//! Per-(class, selector) record of installed hooks.
//!
//! Entries are immutable once published. Hooking a pair again publishes a
//! new entry whose `predecessor` is the one it displaced, so every layer
//! stays reachable and the composition order can be read back with
//! [`HookRegistry::history`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::config::SwizzleConfig;
use crate::interceptor::hook::Hook;
use crate::runtime::{Class, ClassId, Sel};
use crate::types::{Imp, SignatureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookKey {
    pub class: ClassId,
    pub selector: Sel,
}

impl HookKey {
    pub fn new(class: &Class, selector: Sel) -> Self {
        Self {
            class: class.id(),
            selector,
        }
    }
}

pub struct HookEntry {
    key: HookKey,
    class_name: String,
    hook: Hook,
    /// What resolution produced for the selector just before this install.
    original: Option<Imp>,
    /// Class whose table supplied `original`.
    answered_by: Option<String>,
    /// Set when `original` was itself a trampoline routed through an entry.
    predecessor: Option<Arc<HookEntry>>,
    depth: usize,
}

impl HookEntry {
    pub(crate) fn new(
        class: &Class,
        selector: Sel,
        hook: Hook,
        original: Option<(&Class, Imp)>,
        predecessor: Option<Arc<HookEntry>>,
    ) -> Self {
        let depth = predecessor.as_ref().map_or(1, |p| p.depth + 1);
        Self {
            key: HookKey::new(class, selector),
            class_name: class.name().to_string(),
            hook,
            original: original.map(|(_, imp)| imp),
            answered_by: original.map(|(owner, _)| owner.name().to_string()),
            predecessor,
            depth,
        }
    }

    pub fn key(&self) -> HookKey {
        self.key
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn selector(&self) -> Sel {
        self.key.selector
    }

    pub fn signature(&self) -> SignatureKind {
        self.hook.kind()
    }

    pub fn hook(&self) -> &Hook {
        &self.hook
    }

    pub fn original(&self) -> Option<Imp> {
        self.original
    }

    pub fn answered_by(&self) -> Option<&str> {
        self.answered_by.as_deref()
    }

    pub fn predecessor(&self) -> Option<&Arc<HookEntry>> {
        self.predecessor.as_ref()
    }

    /// 1 for a hook over a native (or missing) implementation, one more for
    /// each hook layer beneath it.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEntry")
            .field("class", &self.class_name)
            .field("selector", &self.key.selector)
            .field("signature", &self.signature())
            .field("original", &self.original)
            .field("answered_by", &self.answered_by)
            .field("depth", &self.depth)
            .finish()
    }
}

/// One per runtime. Owns every entry for the registry's lifetime; nothing is
/// ever removed.
pub struct HookRegistry {
    entries: RwLock<HashMap<HookKey, Arc<HookEntry>>>,
    config: SwizzleConfig,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::with_config(SwizzleConfig::default())
    }

    pub fn with_config(config: SwizzleConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &SwizzleConfig {
        &self.config
    }

    /// Current (newest) entry for the pair.
    pub fn get(&self, class: &Class, selector: Sel) -> Option<Arc<HookEntry>> {
        self.entries
            .read()
            .unwrap()
            .get(&HookKey::new(class, selector))
            .cloned()
    }

    /// Make a fully built entry visible, displacing the current one.
    pub(crate) fn publish(&self, entry: Arc<HookEntry>) -> Option<Arc<HookEntry>> {
        self.entries.write().unwrap().insert(entry.key, entry)
    }

    /// Every layer reachable from the current entry, newest first. Layers
    /// installed on an ancestor and captured as an original are included.
    pub fn history(&self, class: &Class, selector: Sel) -> Vec<Arc<HookEntry>> {
        std::iter::successors(self.get(class, selector), |entry| entry.predecessor.clone())
            .collect()
    }

    pub fn hooked_selectors(&self, class: &Class) -> Vec<Sel> {
        let id = class.id();
        self.entries
            .read()
            .unwrap()
            .keys()
            .filter(|key| key.class == id)
            .map(|key| key.selector)
            .collect()
    }

    /// Number of (class, selector) pairs with a hook.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
