//! Runtime configuration, read from the environment or built in code.

/// Enables per-call trampoline trace lines.
pub const ENV_TRACE: &str = "MALWI_SWIZZLE_TRACE";
/// Silences the `info` line the installer writes for every hook.
pub const ENV_QUIET: &str = "MALWI_SWIZZLE_QUIET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwizzleConfig {
    /// Log every trampoline entry at `trace` level.
    pub trace_dispatch: bool,
    /// Log each `add_instance_method` at `info` level.
    pub log_installs: bool,
}

impl Default for SwizzleConfig {
    fn default() -> Self {
        Self {
            trace_dispatch: false,
            log_installs: true,
        }
    }
}

impl SwizzleConfig {
    /// Build a config from `MALWI_SWIZZLE_TRACE` / `MALWI_SWIZZLE_QUIET`.
    ///
    /// Unset or unrecognised values keep the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_TRACE).as_deref().and_then(parse_flag) {
            config.trace_dispatch = v;
        }
        if let Some(v) = lookup(ENV_QUIET).as_deref().and_then(parse_flag) {
            config.log_installs = !v;
        }
        config
    }

    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    pub fn with_log_installs(mut self, enabled: bool) -> Self {
        self.log_installs = enabled;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
