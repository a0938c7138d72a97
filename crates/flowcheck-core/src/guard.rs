//! Panic capture for user step code.
//!
//! `catch` runs a closure under `catch_unwind`. While a guarded closure runs
//! on the current thread, a process-wide panic hook (installed once) records
//! the panic location and a backtrace instead of printing them; panics on
//! other threads, or outside a guard, go to the previously installed hook.
//!
//! Requires `panic = "unwind"` (the workspace profiles set it).

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// A panic caught inside a guarded closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaughtPanic {
    /// The panic payload rendered as text.
    pub message: String,
    /// Where the panic was raised, when known.
    pub location: Option<String>,
    /// Backtrace captured at the panic site.
    pub backtrace: String,
}

struct Captured {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static GUARD_DEPTH: Cell<u32> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<Captured>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(|depth| depth.get()) > 0 {
                let captured = Captured {
                    location: info.location().map(|l| l.to_string()),
                    backtrace: Backtrace::force_capture().to_string(),
                };
                LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(captured));
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `f`, converting a panic into `CaughtPanic`.
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, CaughtPanic> {
    install_hook();
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    result.map_err(|payload| {
        let captured = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        let (location, backtrace) = match captured {
            Some(c) => (c.location, c.backtrace),
            None => (None, String::new()),
        };
        CaughtPanic {
            message: payload_message(payload.as_ref()),
            location,
            backtrace,
        }
    })
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_passes_value_through() {
        assert_eq!(catch(|| 41 + 1), Ok(42));
    }

    #[test]
    fn test_catch_str_payload() {
        let caught = catch(|| -> u32 { panic!("boom") }).unwrap_err();
        assert_eq!(caught.message, "boom");
        assert!(caught.location.unwrap().contains("guard.rs"));
        assert!(!caught.backtrace.is_empty());
    }

    #[test]
    fn test_catch_formatted_payload() {
        let n = 7;
        let caught = catch(|| -> u32 { panic!("bad value {n}") }).unwrap_err();
        assert_eq!(caught.message, "bad value 7");
    }

    #[test]
    fn test_catch_non_string_payload() {
        let caught = catch(|| -> u32 { std::panic::panic_any(17u8) }).unwrap_err();
        assert_eq!(caught.message, "non-string panic payload");
    }

    #[test]
    fn test_nested_catch_inner_handles_panic() {
        let outer = catch(|| catch(|| -> u32 { panic!("inner") }).is_err());
        assert_eq!(outer, Ok(true));
    }

    #[test]
    fn test_guard_depth_reset_after_panic() {
        let _ = catch(|| -> u32 { panic!("reset me") });
        assert_eq!(GUARD_DEPTH.with(|d| d.get()), 0);
    }
}
