//! Scoped environment variable overrides
//!
//! Child interpreters inherit the environment at spawn time, so the engine
//! sets `PYTHONPATH` (and occasionally a framework variable) just for the
//! duration of one query. [`EnvOverride`] saves the prior value, and its
//! `Drop` restores it, including during unwinding.
//!
//! Every override holds one process-wide re-entrant lock until it is
//! dropped. The owning thread can nest overrides; other threads wait.

use once_cell::sync::Lazy;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::{OsStr, OsString};

static ENV_LOCK: Lazy<ReentrantMutex<()>> = Lazy::new(|| ReentrantMutex::new(()));

/// Hold the environment lock without changing anything
pub(crate) fn lock() -> ReentrantMutexGuard<'static, ()> {
    ENV_LOCK.lock()
}

/// Guard restoring one environment variable when dropped
#[must_use = "the variable is restored as soon as the guard is dropped"]
pub struct EnvOverride {
    key: OsString,
    prior: Option<OsString>,
    _lock: ReentrantMutexGuard<'static, ()>,
}

impl EnvOverride {
    /// Set `key` to `value` until the guard is dropped
    pub fn set(key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        let lock = ENV_LOCK.lock();
        let key = key.as_ref().to_os_string();
        let prior = env::var_os(&key);
        env::set_var(&key, value);
        EnvOverride {
            key,
            prior,
            _lock: lock,
        }
    }

    /// Unset `key` until the guard is dropped
    pub fn unset(key: impl AsRef<OsStr>) -> Self {
        let lock = ENV_LOCK.lock();
        let key = key.as_ref().to_os_string();
        let prior = env::var_os(&key);
        env::remove_var(&key);
        EnvOverride {
            key,
            prior,
            _lock: lock,
        }
    }

    /// The value that will be restored (`None` means the variable is removed)
    pub fn prior(&self) -> Option<&OsStr> {
        self.prior.as_deref()
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.prior {
            Some(ref value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}

impl std::fmt::Debug for EnvOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvOverride")
            .field("key", &self.key)
            .field("prior", &self.prior)
            .finish_non_exhaustive()
    }
}

/// Run `body` with `key` set to `value`, restoring the prior state afterwards
///
/// The result of `body` is returned untouched, errors included.
pub fn with_override<K, V, F, T>(key: K, value: V, body: F) -> T
where
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
    F: FnOnce() -> T,
{
    let _guard = EnvOverride::set(key, value);
    body()
}
