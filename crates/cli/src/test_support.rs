//! Process-environment helpers for tests that exercise env overrides.

use std::sync::{Mutex, MutexGuard, OnceLock};

const MANAGED_VARS: &[&str] = &["HOME", "PXCHAT_BACKEND_URL", "PXCHAT_TICK_MS"];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Serializes env mutation across tests and restores every pxchat-relevant
/// variable when dropped. Overrides start cleared.
pub(crate) struct ScopedEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub(crate) fn new() -> Self {
        // A panicking test poisons the lock; the env is restored by its guard anyway.
        let lock = env_lock().lock().unwrap_or_else(|e| e.into_inner());
        let saved = MANAGED_VARS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();
        let env = Self { saved, _lock: lock };
        env.remove("PXCHAT_BACKEND_URL");
        env.remove("PXCHAT_TICK_MS");
        env
    }

    pub(crate) fn set(&self, key: &str, value: &str) {
        // SAFETY: all env mutation in tests goes through a ScopedEnv holding the lock.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    pub(crate) fn remove(&self, key: &str) {
        // SAFETY: see `set`.
        unsafe {
            std::env::remove_var(key);
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => self.set(key, value),
                None => self.remove(key),
            }
        }
    }
}
