//! Dispatch-level behaviour of installed hooks, driven through ordinary sends.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use malwi_swizzle::{Hook, HookError, Imp, Object, Rect, Runtime, SignatureKind, SwizzleConfig};

use crate::common::{fixture, init_logging, sel, view_is_enabled, view_layout};

#[test]
fn test_void_hook_without_prior_implementation() -> Result<()> {
    let fx = fixture()?;
    let layout = sel("layoutSubviews");
    let flag = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&flag);

    // Foo has no layoutSubviews anywhere in its hierarchy.
    unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.foo,
            layout,
            Hook::void(move |this| {
                this.invoke_super(layout);
                seen.store(true, Ordering::SeqCst);
            }),
        )?;
    }

    let foo = Object::new(&fx.foo);
    unsafe { foo.send_void(layout)? };
    assert!(flag.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn test_second_hook_sees_first_through_super() -> Result<()> {
    let fx = fixture()?;
    let enabled = sel("isEnabled");
    let interceptor = fx.rt.interceptor();

    unsafe {
        interceptor.add_instance_method(&fx.foo, enabled, Hook::returns_bool(|_| true))?;
        interceptor.add_instance_method(
            &fx.foo,
            enabled,
            Hook::returns_bool(move |this| !this.invoke_super_returns_bool(enabled)),
        )?;
    }

    let foo = Object::new(&fx.foo);
    assert!(!unsafe { foo.send_bool(enabled)? });
    Ok(())
}

#[test]
fn test_layers_run_newest_first_down_to_native() -> Result<()> {
    let fx = fixture()?;
    let layout = sel("layoutSubviews");
    let order = Arc::new(Mutex::new(Vec::new()));
    let interceptor = fx.rt.interceptor();

    for name in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        unsafe {
            interceptor.add_instance_method(
                &fx.view,
                layout,
                Hook::void(move |this| {
                    order.lock().unwrap().push(name);
                    this.invoke_super(layout);
                }),
            )?;
        }
    }

    let view = Object::new(&fx.view);
    unsafe { view.send_void(layout)? };
    assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    // The native implementation ran exactly once at the bottom.
    assert_eq!(view.int_ivar("layoutCount")?, 1);
    assert_eq!(fx.rt.registry().history(&fx.view, layout).len(), 3);
    Ok(())
}

#[test]
fn test_subclass_hook_reaches_ancestor_implementation() -> Result<()> {
    let fx = fixture()?;
    let layout = sel("layoutSubviews");
    let hooked = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hooked);

    let entry = unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.label,
            layout,
            Hook::void(move |this| {
                seen.fetch_add(1, Ordering::SeqCst);
                this.invoke_super(layout);
            }),
        )?
    };
    assert_eq!(entry.answered_by(), Some("View"));
    assert_eq!(entry.original(), Some(Imp::void(view_layout)));

    let label = Object::new(&fx.label);
    unsafe { label.send_void(layout)? };
    assert_eq!(hooked.load(Ordering::SeqCst), 1);
    assert_eq!(label.int_ivar("layoutCount")?, 1);

    // Instances of the ancestor are untouched.
    let view = Object::new(&fx.view);
    unsafe { view.send_void(layout)? };
    assert_eq!(hooked.load(Ordering::SeqCst), 1);
    assert_eq!(view.int_ivar("layoutCount")?, 1);
    assert_eq!(
        fx.view.own_method(layout),
        Some(Imp::void(view_layout))
    );
    Ok(())
}

#[test]
fn test_subclass_hook_layers_over_ancestor_hook() -> Result<()> {
    let fx = fixture()?;
    let enabled = sel("isEnabled");
    let interceptor = fx.rt.interceptor();

    let base = unsafe {
        interceptor.add_instance_method(
            &fx.view,
            enabled,
            Hook::returns_bool(move |this| !this.invoke_super_returns_bool(enabled)),
        )?
    };
    let derived = unsafe {
        interceptor.add_instance_method(
            &fx.label,
            enabled,
            Hook::returns_bool(move |this| !this.invoke_super_returns_bool(enabled)),
        )?
    };
    assert!(Arc::ptr_eq(derived.predecessor().unwrap(), &base));
    assert_eq!(derived.depth(), 2);

    // Label: !(!native) == native == true.
    let label = Object::new(&fx.label);
    assert!(unsafe { label.send_bool(enabled)? });
    // View only sees its own layer: !native == false.
    let view = Object::new(&fx.view);
    assert!(!unsafe { view.send_bool(enabled)? });
    Ok(())
}

#[test]
fn test_ancestor_hook_installed_later_is_not_seen_by_earlier_subclass_hook() -> Result<()> {
    let fx = fixture()?;
    let enabled = sel("isEnabled");
    let interceptor = fx.rt.interceptor();

    unsafe {
        interceptor.add_instance_method(
            &fx.label,
            enabled,
            Hook::returns_bool(move |this| this.invoke_super_returns_bool(enabled)),
        )?;
        interceptor.add_instance_method(&fx.view, enabled, Hook::returns_bool(|_| false))?;
    }

    // The Label layer captured View's native implementation at install time.
    let label = Object::new(&fx.label);
    assert!(unsafe { label.send_bool(enabled)? });
    let view = Object::new(&fx.view);
    assert!(!unsafe { view.send_bool(enabled)? });
    Ok(())
}

#[test]
fn test_rect_argument_reaches_native_original() -> Result<()> {
    let fx = fixture()?;
    let set_bounds = sel("setBounds:");
    let seen = Arc::new(Mutex::new(None));
    let record = Arc::clone(&seen);

    unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.label,
            set_bounds,
            Hook::rect_arg(move |this, rect| {
                *record.lock().unwrap() = Some(rect);
                let doubled = Rect::new(rect.origin.x, rect.origin.y, rect.width() * 2.0, rect.height());
                this.invoke_super_with_rect(set_bounds, doubled);
            }),
        )?;
    }

    let label = Object::new(&fx.label);
    let frame = Rect::new(4.0, 8.0, 50.0, 20.0);
    unsafe { label.send_rect(set_bounds, frame)? };
    assert_eq!(*seen.lock().unwrap(), Some(frame));
    assert_eq!(label.float_ivar("width")?, 100.0);
    Ok(())
}

#[test]
fn test_float_hook_adjusts_native_value() -> Result<()> {
    let fx = fixture()?;
    let width = sel("preferredWidth");

    unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.view,
            width,
            Hook::returns_float(move |this| this.invoke_super_returns_float(width) + 16.0),
        )?;
    }

    let view = Object::new(&fx.view);
    view.set_float_ivar("width", 84.0)?;
    assert_eq!(unsafe { view.send_float(width)? }, 100.0);
    Ok(())
}

#[test]
fn test_bool_argument_forwarded_through_layers() -> Result<()> {
    let fx = fixture()?;
    let needs_pass = sel("needsPassFrom:");
    let interceptor = fx.rt.interceptor();

    unsafe {
        interceptor.add_instance_method(
            &fx.view,
            needs_pass,
            Hook::bool_arg_returns_bool(move |this, previous| {
                this.invoke_super_with_bool_returns_bool(needs_pass, previous)
            }),
        )?;
        interceptor.add_instance_method(
            &fx.view,
            needs_pass,
            Hook::bool_arg_returns_bool(move |this, previous| {
                this.invoke_super_with_bool_returns_bool(needs_pass, !previous)
            }),
        )?;
    }

    // Native returns !arg; the newest layer flips the argument first.
    let view = Object::new(&fx.view);
    assert!(unsafe { view.send_bool_arg(needs_pass, true)? });
    assert!(!unsafe { view.send_bool_arg(needs_pass, false)? });
    Ok(())
}

#[test]
fn test_missing_super_yields_defaults() -> Result<()> {
    let fx = fixture()?;
    let interceptor = fx.rt.interceptor();
    let (flag, value, pass) = (sel("isHidden"), sel("alpha"), sel("canBecomeKey:"));
    let place = sel("placeIn:");
    let placed = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&placed);

    unsafe {
        interceptor.add_instance_method(
            &fx.foo,
            flag,
            Hook::returns_bool(move |this| this.invoke_super_returns_bool(flag)),
        )?;
        interceptor.add_instance_method(
            &fx.foo,
            value,
            Hook::returns_float(move |this| this.invoke_super_returns_float(value)),
        )?;
        interceptor.add_instance_method(
            &fx.foo,
            pass,
            Hook::bool_arg_returns_bool(move |this, arg| {
                this.invoke_super_with_bool_returns_bool(pass, arg)
            }),
        )?;
        interceptor.add_instance_method(
            &fx.foo,
            place,
            Hook::rect_arg(move |this, rect| {
                this.invoke_super_with_rect(place, rect);
                seen.store(true, Ordering::SeqCst);
            }),
        )?;
    }

    let foo = Object::new(&fx.foo);
    unsafe { foo.send_rect(place, Rect::new(0.0, 0.0, 10.0, 10.0))? };
    assert!(placed.load(Ordering::SeqCst));
    assert!(!unsafe { foo.send_bool(flag)? });
    assert_eq!(unsafe { foo.send_float(value)? }, 0.0);
    assert!(!unsafe { foo.send_bool_arg(pass, true)? });
    Ok(())
}

#[test]
fn test_super_outside_hook_runs_layer_below_reached_entry() -> Result<()> {
    let fx = fixture()?;
    let enabled = sel("isEnabled");
    let layout = sel("layoutSubviews");
    let interceptor = fx.rt.interceptor();

    unsafe {
        interceptor.add_instance_method(&fx.view, enabled, Hook::returns_bool(|_| false))?;
        interceptor.add_instance_method(&fx.view, layout, Hook::void(|_| {}))?;
    }

    let view = Object::new(&fx.view);
    assert!(!unsafe { view.send_bool(enabled)? });
    // Not inside any hook: calls the captured native implementation.
    unsafe {
        assert!(view.invoke_super_returns_bool(enabled));
        view.invoke_super(layout);
    }
    assert_eq!(view.int_ivar("layoutCount")?, 1);
    Ok(())
}

#[test]
fn test_super_outside_hook_on_unhooked_selector_reaches_inherited_impl() -> Result<()> {
    let fx = fixture()?;
    let label = Object::new(&fx.label);
    // Label inherits both selectors from View; neither is hooked.
    unsafe {
        assert!(label.invoke_super_with_bool_returns_bool(sel("needsPassFrom:"), false));
        label.invoke_super(sel("layoutSubviews"));
    }
    assert_eq!(label.int_ivar("layoutCount")?, 1);

    // View is a root class: nothing above it answers.
    let view = Object::new(&fx.view);
    unsafe {
        assert!(!view.invoke_super_returns_bool(sel("isEnabled")));
        view.invoke_super(sel("layoutSubviews"));
    }
    assert_eq!(view.int_ivar("layoutCount")?, 0);
    Ok(())
}

#[test]
fn test_super_with_wrong_shape_returns_default() -> Result<()> {
    let fx = fixture()?;
    let enabled = sel("isEnabled");
    let result = Arc::new(Mutex::new(None));
    let record = Arc::clone(&result);

    unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.view,
            enabled,
            Hook::returns_bool(move |this| {
                *record.lock().unwrap() = Some(this.invoke_super_returns_float(enabled));
                this.invoke_super_returns_bool(enabled)
            }),
        )?;
    }

    let view = Object::new(&fx.view);
    assert!(unsafe { view.send_bool(enabled)? });
    assert_eq!(*result.lock().unwrap(), Some(0.0));
    Ok(())
}

#[test]
fn test_reentrant_send_from_hook_on_other_receiver() -> Result<()> {
    let fx = fixture()?;
    let layout = sel("layoutSubviews");
    let child = Object::new(&fx.view);
    let inner = Arc::clone(&child);

    unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.view,
            layout,
            Hook::void(move |this| {
                // Lay out the child first, unless this is the child.
                if !Object::ptr_eq(this, &inner) {
                    unsafe { inner.send_void(layout) }.unwrap();
                }
                this.invoke_super(layout);
            }),
        )?;
    }

    let parent = Object::new(&fx.view);
    unsafe { parent.send_void(layout)? };
    assert_eq!(parent.int_ivar("layoutCount")?, 1);
    assert_eq!(child.int_ivar("layoutCount")?, 1);
    Ok(())
}

#[test]
fn test_recursive_send_on_same_receiver_runs_full_chain_again() -> Result<()> {
    let fx = fixture()?;
    let layout = sel("layoutSubviews");
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    unsafe {
        fx.rt.interceptor().add_instance_method(
            &fx.view,
            layout,
            Hook::void(move |this| {
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    unsafe { this.send_void(layout) }.unwrap();
                }
                this.invoke_super(layout);
            }),
        )?;
    }

    let view = Object::new(&fx.view);
    unsafe { view.send_void(layout)? };
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(view.int_ivar("layoutCount")?, 2);
    Ok(())
}

#[test]
fn test_dispatch_table_points_at_shape_trampoline() -> Result<()> {
    let fx = fixture()?;
    let enabled = sel("isEnabled");
    assert_eq!(
        fx.view.own_method(enabled),
        Some(Imp::returns_bool(view_is_enabled))
    );
    unsafe {
        fx.rt
            .interceptor()
            .add_instance_method(&fx.view, enabled, Hook::returns_bool(|_| true))?;
    }
    assert_eq!(
        fx.view.own_method(enabled),
        Some(SignatureKind::ReturnsBool.trampoline())
    );
    assert_eq!(fx.rt.registry().hooked_selectors(&fx.view), vec![enabled]);
    Ok(())
}

#[test]
fn test_hook_on_class_from_other_runtime_rejected() -> Result<()> {
    let fx = fixture()?;
    let other = fixture()?;
    let err = unsafe {
        other
            .rt
            .interceptor()
            .add_instance_method(&fx.view, sel("layoutSubviews"), Hook::void(|_| {}))
    }
    .unwrap_err();
    assert!(matches!(err, HookError::ForeignClass(ref name) if name == "View"));
    Ok(())
}

#[test]
fn test_traced_runtime_dispatches_normally() -> Result<()> {
    init_logging();
    let config = SwizzleConfig::default()
        .with_trace_dispatch(true)
        .with_log_installs(false);
    let rt = Runtime::with_config(config);
    assert_eq!(*rt.config(), config);

    let enabled = sel("isEnabled");
    let control = rt
        .define_class("Control", None)
        .method(enabled, Imp::returns_bool(view_is_enabled))
        .register()?;
    unsafe {
        rt.interceptor().add_instance_method(
            &control,
            enabled,
            Hook::returns_bool(move |this| !this.invoke_super_returns_bool(enabled)),
        )?;
    }
    assert!(rt.registry().config().trace_dispatch);
    assert!(!unsafe { Object::new(&control).send_bool(enabled)? });
    Ok(())
}
