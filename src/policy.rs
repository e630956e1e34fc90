/// How the client reacts to the rate snapshot reported by the server.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThrottlePolicy {
    /// Sleep for the whole limit window once the count reaches one below the limit.
    #[default]
    FixedWait,
    /// Never wait; the server's own `429` is the only back-pressure.
    Disabled,
}

impl ThrottlePolicy {
    pub(crate) fn is_enabled(self) -> bool {
        matches!(self, ThrottlePolicy::FixedWait)
    }
}

/// What to do when a call fails with `NOAUTH`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReauthPolicy {
    /// Log in again with the stored credentials and replay the call once.
    #[default]
    Once,
    /// Surface `NOAUTH` to the caller.
    Never,
}

impl ReauthPolicy {
    /// Total attempts a single call may make, the first one included.
    pub(crate) fn max_attempts(self) -> u8 {
        match self {
            ReauthPolicy::Once => 2,
            ReauthPolicy::Never => 1,
        }
    }
}
