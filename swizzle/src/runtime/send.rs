//! Typed message send.
//!
//! Each send resolves the selector from the receiver's class and calls the
//! bound entry point through the native signature of the requested shape.
//! The runtime does not record method signatures, so picking the shape is
//! the caller's contract, exactly as with a casted `objc_msgSend`.

use crate::error::{HookError, Result};
use crate::runtime::{Object, Sel};
use crate::types::{Imp, Rect};

impl Object {
    fn imp_for_send(&self, sel: Sel) -> Result<Imp> {
        self.class()
            .instance_method(sel)
            .ok_or_else(|| HookError::SelectorUnresolved {
                class: self.class().name().to_string(),
                selector: sel.name().to_string(),
            })
    }

    /// # Safety
    /// `sel` must resolve to an implementation of shape `(self, _cmd)`.
    pub unsafe fn send_void(&self, sel: Sel) -> Result<()> {
        let imp = self.imp_for_send(sel)?;
        imp.as_void()(self.as_ptr(), sel);
        Ok(())
    }

    /// # Safety
    /// `sel` must resolve to an implementation of shape `(self, _cmd, Rect)`.
    pub unsafe fn send_rect(&self, sel: Sel, rect: Rect) -> Result<()> {
        let imp = self.imp_for_send(sel)?;
        imp.as_rect_arg()(self.as_ptr(), sel, rect);
        Ok(())
    }

    /// # Safety
    /// `sel` must resolve to an implementation of shape `(self, _cmd) -> f64`.
    pub unsafe fn send_float(&self, sel: Sel) -> Result<f64> {
        let imp = self.imp_for_send(sel)?;
        Ok(imp.as_returns_float()(self.as_ptr(), sel))
    }

    /// # Safety
    /// `sel` must resolve to an implementation of shape `(self, _cmd) -> bool`.
    pub unsafe fn send_bool(&self, sel: Sel) -> Result<bool> {
        let imp = self.imp_for_send(sel)?;
        Ok(imp.as_returns_bool()(self.as_ptr(), sel))
    }

    /// # Safety
    /// `sel` must resolve to an implementation of shape
    /// `(self, _cmd, bool) -> bool`.
    pub unsafe fn send_bool_arg(&self, sel: Sel, arg: bool) -> Result<bool> {
        let imp = self.imp_for_send(sel)?;
        Ok(imp.as_bool_arg_returns_bool()(self.as_ptr(), sel, arg))
    }
}
