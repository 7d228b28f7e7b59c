//! Service state as seen through `rc-service status`
//!
//! OpenRC keeps no systemd-style state machine, so the state is inferred
//! from the status exit code:
//!
//! ```text
//!   exit 0     -> active   (running)
//!   exit 1, 2  -> failed   (failed)
//!   exit 3     -> inactive (dead)
//!   other      -> unknown  (unknown)
//! ```

/// High-level service state (maps to systemd's ActiveState)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    Active,
    Inactive,
    Failed,
    Unknown,
}

impl ActiveState {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => Self::Active,
            1 | 2 => Self::Failed,
            3 => Self::Inactive,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    pub fn sub_state(&self) -> SubState {
        match self {
            Self::Active => SubState::Running,
            Self::Inactive => SubState::Dead,
            Self::Failed => SubState::Failed,
            Self::Unknown => SubState::Unknown,
        }
    }
}

/// Detailed service state (maps to systemd's SubState)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubState {
    Running,
    Dead,
    Failed,
    Unknown,
}

impl SubState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Dead => "dead",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Does a `--state` filter select a service in these states?
pub fn state_matches(active: ActiveState, sub: SubState, filter: &str) -> bool {
    if active.as_str() == filter || sub.as_str() == filter {
        return true;
    }
    match filter {
        "running" => active == ActiveState::Active && sub == SubState::Running,
        "dead" => active == ActiveState::Inactive && sub == SubState::Dead,
        "failed" => active == ActiveState::Failed || sub == SubState::Failed,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(ActiveState::from_exit_code(0), ActiveState::Active);
        assert_eq!(ActiveState::from_exit_code(1), ActiveState::Failed);
        assert_eq!(ActiveState::from_exit_code(2), ActiveState::Failed);
        assert_eq!(ActiveState::from_exit_code(3), ActiveState::Inactive);
        assert_eq!(ActiveState::from_exit_code(4), ActiveState::Unknown);
        assert_eq!(ActiveState::from_exit_code(-1), ActiveState::Unknown);
    }

    #[test]
    fn test_sub_state() {
        assert_eq!(ActiveState::Active.sub_state().as_str(), "running");
        assert_eq!(ActiveState::Inactive.sub_state().as_str(), "dead");
        assert_eq!(ActiveState::Failed.sub_state().as_str(), "failed");
        assert_eq!(ActiveState::Unknown.sub_state().as_str(), "unknown");
    }

    #[test]
    fn test_state_matches() {
        let (a, s) = (ActiveState::Active, SubState::Running);
        assert!(state_matches(a, s, "active"));
        assert!(state_matches(a, s, "running"));
        assert!(!state_matches(a, s, "inactive"));

        let (a, s) = (ActiveState::Inactive, SubState::Dead);
        assert!(state_matches(a, s, "dead"));
        assert!(state_matches(a, s, "inactive"));
        assert!(!state_matches(a, s, "failed"));

        let (a, s) = (ActiveState::Failed, SubState::Failed);
        assert!(state_matches(a, s, "failed"));
        assert!(!state_matches(a, s, "bogus"));
    }
}
