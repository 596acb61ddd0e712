//! Integration tests for method hook dispatch.
//!
//! These tests drive the public [`HookBridge`] API the way a native interception
//! layer and a set of modules would: register handlers, route calls through
//! `dispatch`, and check ordering, early resolution, exception propagation and
//! snapshot isolation.

use hookbridge::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, OnceLock, Weak,
};

/// The "real" implementation of every test method returns 21 and counts calls.
fn bridge_with_counter() -> (Arc<AtomicUsize>, HookBridge) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let bridge = HookBridge::new(FnInterceptor::new(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::from(21))
    }));
    (calls, bridge)
}

fn target() -> MethodId {
    MethodId::method("com.example.Service", "compute", "()I")
}

fn doubling_after() -> ClosureHook {
    ClosureHook::new().after(|param| {
        let value = param.result().as_i32().unwrap_or_default();
        param.set_result(Value::from(value * 2));
        Ok(())
    })
}

fn recording(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> ClosureHook {
    let before = Arc::clone(log);
    let after = Arc::clone(log);
    ClosureHook::new()
        .before(move |_| {
            before.lock().unwrap().push(format!("{name}.before"));
            Ok(())
        })
        .after(move |_| {
            after.lock().unwrap().push(format!("{name}.after"));
            Ok(())
        })
}

/// H2 (100) doubles in its after-phase, H1 (50) resolves with 1 in its
/// before-phase: the result is 2 and the original never runs.
#[test]
fn test_early_result_is_wrapped_by_outer_handler() -> Result<()> {
    let (calls, bridge) = bridge_with_counter();
    let method = target();

    bridge.hook_method(&method, &Handler::method(Priority(100), doubling_after()))?;
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority(50),
            ClosureHook::new().before(|param| {
                param.set_result(Value::from(1));
                Ok(())
            }),
        ),
    )?;

    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

/// Same chain with H1 not resolving: the original runs and its result is doubled.
#[test]
fn test_original_result_is_wrapped_by_outer_handler() -> Result<()> {
    let (calls, bridge) = bridge_with_counter();
    let method = target();

    bridge.hook_method(&method, &Handler::method(Priority(100), doubling_after()))?;
    bridge.hook_method(&method, &Handler::method(Priority(50), ClosureHook::new()))?;

    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_onion_order_with_early_resolution() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    let log = Arc::new(Mutex::new(Vec::new()));

    bridge.hook_method(&method, &Handler::method(Priority(300), recording(&log, "a")))?;
    bridge.hook_method(&method, &Handler::method(Priority(200), recording(&log, "b")))?;
    bridge.hook_method(
        &method,
        &Handler::replacement(Priority(150), |_| Ok(Value::from("replaced"))),
    )?;
    bridge.hook_method(&method, &Handler::method(Priority(100), recording(&log, "c")))?;

    let outcome = bridge.dispatch(&method, None, Vec::new())?;
    assert_eq!(outcome, Ok(Value::from("replaced")));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["a.before", "b.before", "b.after", "a.after"]
    );
    Ok(())
}

#[test]
fn test_transparent_when_no_handler_intervenes() -> Result<()> {
    let bridge = HookBridge::new(FnInterceptor::new(|method, this, args| {
        Ok(Value::from(format!(
            "{}:{}:{}",
            method.name(),
            this.and_then(Value::as_str).unwrap_or("-"),
            args.len()
        )))
    }));
    let method = MethodId::method("com.example.Service", "describe", "(II)Ljava/lang/String;");
    let log = Arc::new(Mutex::new(Vec::new()));
    bridge.hook_method(&method, &Handler::method(Priority(10), recording(&log, "x")))?;
    bridge.hook_method(&method, &Handler::method(Priority(20), recording(&log, "y")))?;

    let this = Some(Value::from("self"));
    let args = vec![Value::from(1), Value::from(2)];
    let direct = bridge.invoke_original(&method, this.as_ref(), &args);
    let hooked = bridge.dispatch(&method, this, args)?;
    assert_eq!(hooked, direct);
    assert_eq!(log.lock().unwrap().len(), 4);
    Ok(())
}

#[test]
fn test_original_exception_rethrown_unless_handled() -> Result<()> {
    let bridge = HookBridge::new(FnInterceptor::new(|_, _, args| match args.first() {
        Some(Value::Null) => Err(Exception::new("java.lang.NullPointerException")),
        _ => Ok(Value::from(true)),
    }));
    let method = MethodId::static_method("com.example.Util", "check", "(Ljava/lang/Object;)Z");

    let observed = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&observed);
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority::DEFAULT,
            ClosureHook::new().after(move |param| {
                if param.has_throwable() {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }),
        ),
    )?;

    assert_eq!(
        bridge.dispatch(&method, None, vec![Value::Null])?,
        Err(Exception::new("java.lang.NullPointerException"))
    );
    assert_eq!(bridge.dispatch(&method, None, vec![Value::from(1)])?, Ok(Value::from(true)));
    assert_eq!(observed.load(Ordering::SeqCst), 1);

    // An outer handler may swallow the exception.
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority::HIGHEST,
            ClosureHook::new().after(|param| {
                if param.has_throwable() {
                    param.set_result(Value::from(false));
                }
                Ok(())
            }),
        ),
    )?;
    assert_eq!(bridge.dispatch(&method, None, vec![Value::Null])?, Ok(Value::from(false)));
    Ok(())
}

#[test]
fn test_early_throw() -> Result<()> {
    let (calls, bridge) = bridge_with_counter();
    let method = target();
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority::DEFAULT,
            ClosureHook::new().before(|param| {
                param.set_throwable(
                    Exception::new("java.lang.SecurityException").with_message("denied"),
                );
                Ok(())
            }),
        ),
    )?;

    let outcome = bridge.dispatch(&method, None, Vec::new())?;
    assert_eq!(
        outcome.map_err(|e| e.to_string()),
        Err("java.lang.SecurityException: denied".to_string())
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn test_equal_priorities_keep_registration_order() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    let log = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        bridge.hook_method(&method, &Handler::method(Priority::DEFAULT, recording(&log, name)))?;
    }

    bridge.dispatch(&method, None, Vec::new())?.ok();
    let first_run = std::mem::take(&mut *log.lock().unwrap());
    bridge.dispatch(&method, None, Vec::new())?.ok();
    let second_run = log.lock().unwrap().clone();

    assert_eq!(first_run, second_run);
    assert_eq!(
        first_run,
        vec![
            "first.before",
            "second.before",
            "third.before",
            "third.after",
            "second.after",
            "first.after"
        ]
    );
    Ok(())
}

#[test]
fn test_equal_priorities_order_by_registration_not_creation() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    let log = Arc::new(Mutex::new(Vec::new()));

    let created_first = Handler::method(Priority::DEFAULT, recording(&log, "created_first"));
    let created_second = Handler::method(Priority::DEFAULT, recording(&log, "created_second"));
    bridge.hook_method(&method, &created_second)?;
    bridge.hook_method(&method, &created_first)?;

    let _ = bridge.dispatch(&method, None, Vec::new())?;
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "created_second.before",
            "created_first.before",
            "created_first.after",
            "created_second.after"
        ]
    );

    // Re-registering moves a handler behind its equal-priority peers.
    assert!(bridge.unhook_method(&method, &created_second));
    bridge.hook_method(&method, &created_second)?;
    log.lock().unwrap().clear();
    let _ = bridge.dispatch(&method, None, Vec::new())?;
    assert_eq!(log.lock().unwrap()[..2], ["created_first.before", "created_second.before"]);
    Ok(())
}

#[test]
fn test_removal_mid_dispatch_affects_next_dispatch_only() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    let log = Arc::new(Mutex::new(Vec::new()));

    let victim: Arc<OnceLock<MethodUnhook>> = Arc::new(OnceLock::new());
    let handle = Arc::clone(&victim);
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority(100),
            ClosureHook::new().before(move |_| {
                if let Some(unhook) = handle.get() {
                    unhook.unhook();
                }
                Ok(())
            }),
        ),
    )?;
    let unhook = bridge.hook_method(&method, &Handler::method(Priority(10), recording(&log, "victim")))?;
    victim.set(unhook).ok();

    bridge.dispatch(&method, None, Vec::new())?.ok();
    assert_eq!(*log.lock().unwrap(), vec!["victim.before", "victim.after"]);
    assert_eq!(bridge.handler_count(&method), 1);

    bridge.dispatch(&method, None, Vec::new())?.ok();
    assert_eq!(log.lock().unwrap().len(), 2);
    Ok(())
}

#[test]
fn test_add_then_remove_restores_behavior() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    bridge.hook_method(&method, &Handler::method(Priority(100), doubling_after()))?;
    let before = bridge.dispatch(&method, None, Vec::new())?;

    let extra = Handler::returns_constant(Priority(50), Value::from(-1));
    let unhook = bridge.hook_method(&method, &extra)?;
    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(-2)));
    assert!(unhook.unhook());

    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, before);
    assert_eq!(bridge.handler_count(&method), 1);
    Ok(())
}

#[test]
fn test_duplicate_registration_rejected() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    bridge.hook_method(&method, &Handler::do_nothing())?;
    assert!(matches!(
        bridge.hook_method(&method, &Handler::do_nothing()),
        Err(Error::DuplicateHandler { .. })
    ));
    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::Void));
    Ok(())
}

#[test]
fn test_unknown_method_dispatch() {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    assert!(matches!(
        bridge.dispatch(&method, None, Vec::new()),
        Err(Error::UnknownMethod(m)) if m == method
    ));
}

#[test]
fn test_reentrant_dispatch() -> Result<()> {
    let slot: Arc<OnceLock<Weak<HookBridge>>> = Arc::new(OnceLock::new());
    let bridge_ref = Arc::clone(&slot);
    let outer = MethodId::method("com.example.Service", "outer", "()I");
    let inner = MethodId::method("com.example.Service", "inner", "()I");
    let inner_id = inner.clone();

    // The original `outer` calls `inner`, which is hooked as well.
    let bridge = Arc::new(HookBridge::new(FnInterceptor::new(move |method, _, _| {
        if method.name() == "outer" {
            let bridge = bridge_ref.get().and_then(Weak::upgrade).expect("bridge alive");
            return match bridge.dispatch(&inner_id, None, Vec::new()) {
                Ok(outcome) => outcome.map(|v| Value::from(v.as_i32().unwrap_or_default() + 1)),
                Err(e) => Err(Exception::new("java.lang.Error").with_message(e.to_string())),
            };
        }
        Ok(Value::from(10))
    })));
    slot.set(Arc::downgrade(&bridge)).ok();

    bridge.hook_method(&outer, &Handler::method(Priority::DEFAULT, doubling_after()))?;
    bridge.hook_method(&inner, &Handler::method(Priority::DEFAULT, doubling_after()))?;

    // inner: 10 * 2 = 20, outer original: 20 + 1 = 21, outer hook: 42
    assert_eq!(bridge.dispatch(&outer, None, Vec::new())?, Ok(Value::from(42)));
    Ok(())
}

#[test]
fn test_recursion_limit() -> Result<()> {
    let slot: Arc<OnceLock<Weak<HookBridge>>> = Arc::new(OnceLock::new());
    let bridge_ref = Arc::clone(&slot);
    let method = target();
    let recurse = method.clone();

    let bridge = Arc::new(HookBridge::with_config(
        FnInterceptor::new(|_, _, _| Ok(Value::Void)),
        BridgeConfig::default().with_max_dispatch_depth(8),
    ));
    slot.set(Arc::downgrade(&bridge)).ok();

    let depth_errors = Arc::new(AtomicUsize::new(0));
    let errors = Arc::clone(&depth_errors);
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority::DEFAULT,
            ClosureHook::new().before(move |_| {
                let bridge = bridge_ref.get().and_then(Weak::upgrade).expect("bridge alive");
                if let Err(Error::RecursionLimit(8)) = bridge.dispatch(&recurse, None, Vec::new()) {
                    errors.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }),
        ),
    )?;

    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::Void));
    assert_eq!(depth_errors.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_failing_handler_does_not_stop_chain() -> Result<()> {
    let (calls, bridge) = bridge_with_counter();
    let method = target();
    bridge.hook_method(&method, &Handler::method(Priority(100), doubling_after()))?;
    bridge.hook_method(
        &method,
        &Handler::method(
            Priority(50),
            ClosureHook::new()
                .before(|_| Err("module bug".into()))
                .after(|_| panic!("module panic")),
        ),
    )?;

    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_hooks_disabled() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let bridge = HookBridge::with_config(
        FnInterceptor::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from(21))
        }),
        BridgeConfig::passthrough(),
    );
    let method = target();
    bridge.hook_method(&method, &Handler::returns_constant(Priority::DEFAULT, Value::from(0)))?;

    assert!(bridge.is_hooked(&method));
    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(21)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_extras_flow_from_before_to_after() -> Result<()> {
    let (_, bridge) = bridge_with_counter();
    let method = target();
    let ticket = Arc::new(Mutex::new(None));
    let out = Arc::clone(&ticket);

    bridge.hook_method(
        &method,
        &Handler::method(
            Priority::DEFAULT,
            ClosureHook::new()
                .before(|param| {
                    param.extras_mut().set("ticket", 7u64);
                    Ok(())
                })
                .after(move |param| {
                    *out.lock().unwrap() = param.extras_mut().remove::<u64>("ticket");
                    Ok(())
                }),
        ),
    )?;

    bridge.dispatch(&method, None, Vec::new())?.ok();
    assert_eq!(*ticket.lock().unwrap(), Some(7));
    Ok(())
}


/// A handler that detects an unsupported environment switches hooks off for
/// the rest of the run; later calls go straight to the original.
#[test]
fn test_hooks_switched_off_by_handler_at_runtime() -> Result<()> {
    let slot: Arc<OnceLock<Weak<HookBridge>>> = Arc::new(OnceLock::new());
    let bridge_ref = Arc::clone(&slot);
    let (calls, bridge) = bridge_with_counter();
    let bridge = Arc::new(bridge);
    slot.set(Arc::downgrade(&bridge)).ok();
    let method = target();

    bridge.hook_method(
        &method,
        &Handler::method(
            Priority::DEFAULT,
            ClosureHook::new().before(move |param| {
                if let Some(bridge) = bridge_ref.get().and_then(Weak::upgrade) {
                    bridge.set_hooks_enabled(false);
                }
                param.set_result(Value::from(0));
                Ok(())
            }),
        ),
    )?;

    assert!(bridge.hooks_enabled());
    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(0)));
    assert!(!bridge.hooks_enabled());
    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(21)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    bridge.set_hooks_enabled(true);
    assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(0)));
    assert_eq!(bridge.handler_count(&method), 1);
    Ok(())
}
