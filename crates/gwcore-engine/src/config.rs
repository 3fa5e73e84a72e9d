/// Static, per-gateway configuration: identity plus the clock parameters
/// that drive `Gateway::sync`.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub name: String,
    pub uid: u32,
    /// Number of register-handshake rounds to attempt before giving up.
    pub register_retry: u32,
    /// Added to `model_time` before every `sync` comparison when positive;
    /// a zero-or-negative value disables the nudge entirely.
    pub clock_epsilon: f64,
    /// Simulation step size; advisory only (the engine advances `model_time`
    /// from whatever the broker's notify frames carry), but used by callers
    /// driving a fixed-step loop.
    pub step_size: f64,
    /// A positive value triggers `SyncOutcome::EndTimeReached` once
    /// `model_time` passes it; zero or negative disables the check.
    pub end_time: f64,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, uid: u32) -> Self {
        Self {
            name: name.into(),
            uid,
            register_retry: 5,
            clock_epsilon: 0.0,
            step_size: 0.0,
            end_time: 0.0,
        }
    }
}
