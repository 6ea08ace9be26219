//! C ABI for native producer threads
//!
//! Native code gets notifier handles from the embedding application
//! (`Notifier::as_raw()` / `Notifier::into_raw()`) and pokes them from any
//! thread without touching Rust-side locks. The declarations live in
//! `include/nhub.h`.
//!
//! Handles are opaque. A borrowed handle is valid while the Rust side
//! keeps the `Notifier` alive; an owned handle until
//! `nhub_notifier_release()`.

use libc::c_int;

use crate::hub::NotificationHub;
use crate::notifier::{Notifier, NotifierInner};

/// Bumped on any incompatible change to the functions below
pub const NHUB_ABI_VERSION: u32 = 0;

/// Opaque notifier handle
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct nhub_notifier {
    _private: [u8; 0],
}

/// Opaque hub handle
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct nhub_hub {
    _private: [u8; 0],
}

#[no_mangle]
pub extern "C" fn nhub_abi_version() -> u32 {
    NHUB_ABI_VERSION
}

/// Poke a notifier.
///
/// Returns 1 if a wakeup was queued, 0 if one was already outstanding,
/// -1 on error (null handle, hub gone or channel failure). Never blocks.
///
/// # Safety
///
/// `notifier` must be null or a live handle from `Notifier::as_raw()` /
/// `Notifier::into_raw()`.
#[no_mangle]
pub unsafe extern "C" fn nhub_notifier_poke(notifier: *const nhub_notifier) -> c_int {
    let Some(inner) = notifier.cast::<NotifierInner>().as_ref() else {
        return -1;
    };
    match inner.poke() {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            tracing::debug!(key = %inner.key(), error = %e, "native poke failed");
            -1
        }
    }
}

/// Release an owned handle from `Notifier::into_raw()`. Null is ignored.
///
/// # Safety
///
/// `notifier` must be null or an owned handle not released before.
#[no_mangle]
pub unsafe extern "C" fn nhub_notifier_release(notifier: *const nhub_notifier) {
    if !notifier.is_null() {
        drop(Notifier::from_raw(notifier));
    }
}

/// Interrupt the hub's pump. Same return convention as
/// `nhub_notifier_poke()`.
///
/// # Safety
///
/// `hub` must be null or come from `NotificationHub::as_raw()` on a hub
/// that is still alive and has not moved.
#[no_mangle]
pub unsafe extern "C" fn nhub_hub_interrupt(hub: *const nhub_hub) -> c_int {
    let Some(hub) = hub.cast::<NotificationHub>().as_ref() else {
        return -1;
    };
    match hub.interrupt() {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PumpExit;
    use std::ptr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_abi_version() {
        assert_eq!(nhub_abi_version(), NHUB_ABI_VERSION);
    }

    #[test]
    fn test_poke_return_codes() {
        let hub = NotificationHub::new(false).unwrap();
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let n = hub
            .add_notify(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let raw = n.as_raw();
        unsafe {
            assert_eq!(nhub_notifier_poke(raw), 1);
            assert_eq!(nhub_notifier_poke(raw), 0);
        }
        hub.handle().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_handles() {
        unsafe {
            assert_eq!(nhub_notifier_poke(ptr::null()), -1);
            assert_eq!(nhub_hub_interrupt(ptr::null()), -1);
            nhub_notifier_release(ptr::null());
        }
    }

    #[test]
    fn test_poke_after_hub_dropped() {
        let hub = NotificationHub::new(false).unwrap();
        let raw = hub.add_notify(|| {}).unwrap().into_raw();
        drop(hub);

        unsafe {
            assert_eq!(nhub_notifier_poke(raw), -1);
            nhub_notifier_release(raw);
        }
    }

    #[test]
    fn test_release_deregisters() {
        let hub = NotificationHub::new(false).unwrap();
        let base = hub.len();

        let raw = hub.add_notify(|| {}).unwrap().into_raw();
        assert_eq!(hub.len(), base + 1);

        unsafe { nhub_notifier_release(raw) };
        assert_eq!(hub.len(), base);
    }

    #[test]
    fn test_hub_interrupt() {
        let hub = NotificationHub::new(false).unwrap();
        let raw = hub.as_raw();

        unsafe {
            assert_eq!(nhub_hub_interrupt(raw), 1);
            assert_eq!(nhub_hub_interrupt(raw), 0);
        }
        assert_eq!(hub.handle().unwrap(), PumpExit::Interrupted);
    }
}
