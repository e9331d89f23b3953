//! Post-load overrides.
//!
//! ```text
//! ConfigLoader.load()  →  WardConfig (base)
//!                              │
//!                     ConfigResolver.apply()
//!                              ▼
//!                         WardConfig (final)
//! ```

use super::WardConfig;

/// Applies overrides (CLI flags, programmatic settings) to a loaded config.
///
/// Only values the caller actually specified should be applied.
pub trait ConfigResolver {
    fn apply(&self, config: &mut WardConfig);
}
