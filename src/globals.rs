//! Process-wide search configuration: the zero-crossing-control flag and the
//! search horizon, encapsulated as a singleton mutated only through a scoped
//! guard that restores the prior value on every exit path.
//!
//! Mirrors `fs0::Config::instance()` and its `DeactivateZCC` RAII guard from
//! the original source, and the `once_cell`-backed static singleton idiom
//! used for `learning::VERBOSE` in the teacher crate.

use once_cell::sync::OnceCell;
use std::cell::Cell;

/// Process-wide configuration consulted by [`crate::iw::IwEngine`] and
/// [`crate::sbfws::SbfwsEngine`].
///
/// Single-threaded by design (see spec §5): the flag is a plain [`Cell`],
/// not an atomic, since this crate never runs a search from more than one
/// thread at a time.
#[derive(Debug)]
pub struct GlobalSearchConfig {
    zero_crossing_control: Cell<bool>,
    horizon_time: Cell<f64>,
}

impl GlobalSearchConfig {
    fn new() -> Self {
        Self {
            zero_crossing_control: Cell::new(true),
            horizon_time: Cell::new(f64::INFINITY),
        }
    }

    /// The single process-wide instance, created lazily on first access.
    pub fn instance() -> &'static GlobalSearchConfig {
        static INSTANCE: OnceCell<GlobalSearchConfig> = OnceCell::new();
        INSTANCE.get_or_init(GlobalSearchConfig::new)
    }

    pub fn zero_crossing_control(&self) -> bool {
        self.zero_crossing_control.get()
    }

    pub fn set_zero_crossing_control(&self, value: bool) {
        self.zero_crossing_control.set(value);
    }

    pub fn horizon_time(&self) -> f64 {
        self.horizon_time.get()
    }

    pub fn set_horizon_time(&self, value: f64) {
        self.horizon_time.set(value);
    }
}

/// Scoped guard that deactivates zero-crossing control for its lifetime and
/// restores the prior setting on drop, regardless of how the scope is
/// exited. Guards nest with stack discipline: the outermost guard restores
/// the value that was current before any nested guard existed.
///
/// Equivalent to `fs0::lookahead::IW<...>::DeactivateZCC` in the original
/// source.
#[derive(Debug)]
pub struct ZccGuard {
    previous: bool,
}

impl ZccGuard {
    pub fn new() -> Self {
        let config = GlobalSearchConfig::instance();
        let previous = config.zero_crossing_control();
        config.set_zero_crossing_control(false);
        Self { previous }
    }
}

impl Default for ZccGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ZccGuard {
    fn drop(&mut self) {
        GlobalSearchConfig::instance().set_zero_crossing_control(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn guard_restores_previous_value_on_drop() {
        let config = GlobalSearchConfig::instance();
        config.set_zero_crossing_control(true);
        {
            let _guard = ZccGuard::new();
            assert!(!config.zero_crossing_control());
        }
        assert!(config.zero_crossing_control());
    }

    #[test]
    #[serial]
    fn nested_guards_restore_outermost_value() {
        let config = GlobalSearchConfig::instance();
        config.set_zero_crossing_control(true);
        {
            let _outer = ZccGuard::new();
            assert!(!config.zero_crossing_control());
            {
                let _inner = ZccGuard::new();
                assert!(!config.zero_crossing_control());
            }
            assert!(!config.zero_crossing_control());
        }
        assert!(config.zero_crossing_control());
    }
}
