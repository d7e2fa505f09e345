//! Process-wide default driver slot.
//!
//! Optional convenience for top-level callers that want one shared driver
//! without threading a handle through every call site. The slot is only
//! ever mutated explicitly (`set_default` / `clear_default`); reads check
//! liveness and drop a dead driver instead of returning it.

use crate::driver::Driver;
use log::debug;
use std::sync::{LazyLock, RwLock};

static DEFAULT_SLOT: LazyLock<RwLock<Option<Driver>>> = LazyLock::new(|| RwLock::new(None));

/// Install `driver` as the process-wide default, replacing any previous one.
pub fn set_default(driver: Driver) {
    let mut slot = DEFAULT_SLOT
        .write()
        .expect("default driver slot poisoned");
    *slot = Some(driver);
}

/// The current default driver, if one is installed and still alive.
///
/// A driver whose background task has stopped is removed from the slot
/// and `None` is returned.
pub fn default_driver() -> Option<Driver> {
    {
        let slot = DEFAULT_SLOT.read().expect("default driver slot poisoned");
        match slot.as_ref() {
            Some(driver) if driver.is_alive() => return Some(driver.clone()),
            None => return None,
            Some(_) => {},
        }
    }

    // Installed driver is dead; evict it.
    let mut slot = DEFAULT_SLOT
        .write()
        .expect("default driver slot poisoned");
    if slot.as_ref().is_some_and(|d| !d.is_alive()) {
        debug!("[DRIVER] evicting dead default driver");
        *slot = None;
    }
    slot.as_ref().filter(|d| d.is_alive()).cloned()
}

/// Remove and return the default driver, if any.
pub fn clear_default() -> Option<Driver> {
    DEFAULT_SLOT
        .write()
        .expect("default driver slot poisoned")
        .take()
}
