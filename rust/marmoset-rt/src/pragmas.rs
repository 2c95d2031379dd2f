//! Process-wide pragma table.
//!
//! Pragmas are named switches with a non-zero integer value; the
//! `pragma` built-in sets, clears (`no-` prefix) and lists them. The
//! interpreter is single-threaded, the mutex only guards bootstrap vs.
//! test access.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Mutex;

static PRAGMAS: Lazy<Mutex<BTreeMap<String, i64>>> = Lazy::new(|| Mutex::new(BTreeMap::new()));

pub fn set(name: &str) {
    PRAGMAS
        .lock()
        .unwrap()
        .insert(name.to_lowercase(), 1);
}

pub fn clear(name: &str) {
    PRAGMAS.lock().unwrap().remove(&name.to_lowercase());
}

pub fn is_set(name: &str) -> bool {
    PRAGMAS.lock().unwrap().contains_key(&name.to_lowercase())
}

/// The active pragma names, sorted.
pub fn active() -> Vec<String> {
    PRAGMAS.lock().unwrap().keys().cloned().collect()
}
