//! Runtime feature gating.
//!
//! Integrations are gated twice: compile-time cargo features on the
//! backend pick which routers exist at all, and runtime `use_*` flags in
//! the configuration decide whether a compiled-in router answers or
//! returns 503.

/// An integration is enabled when its flag is set and its configuration
/// section is present.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_both_flag_and_section() {
        assert!(is_feature_enabled(true, Some(&())));
        assert!(!is_feature_enabled(true, None::<&()>));
        assert!(!is_feature_enabled(false, Some(&())));
    }
}
