//! Interned selectors.
//!
//! A selector names a message independent of any receiver type. Names are
//! interned once per process and never freed, so a `Sel` is a single pointer
//! that compares and hashes by identity and can be passed through the C ABI
//! as the `_cmd` argument.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{OnceLock, RwLock};

struct SelectorName(Box<str>);

#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct Sel(&'static SelectorName);

fn table() -> &'static RwLock<HashMap<&'static str, Sel>> {
    static TABLE: OnceLock<RwLock<HashMap<&'static str, Sel>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

impl Sel {
    /// Look up or intern `name`.
    pub fn register(name: &str) -> Sel {
        if let Some(sel) = table().read().unwrap().get(name) {
            return *sel;
        }
        let mut table = table().write().unwrap();
        // Another thread may have interned it between the two locks.
        if let Some(sel) = table.get(name) {
            return *sel;
        }
        let interned: &'static SelectorName = Box::leak(Box::new(SelectorName(name.into())));
        let sel = Sel(interned);
        table.insert(&*interned.0, sel);
        sel
    }

    /// Look up `name` without interning it.
    pub fn lookup(name: &str) -> Option<Sel> {
        table().read().unwrap().get(name).copied()
    }

    pub fn name(self) -> &'static str {
        &self.0 .0
    }

    #[inline]
    fn addr(self) -> usize {
        self.0 as *const SelectorName as usize
    }
}

impl PartialEq for Sel {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Sel {}

impl Hash for Sel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Sel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@selector({})", self.name())
    }
}

impl fmt::Display for Sel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Sel {
    fn from(name: &str) -> Self {
        Sel::register(name)
    }
}
