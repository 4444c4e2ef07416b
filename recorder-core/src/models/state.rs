/// Recorder lifecycle state.
///
/// State transitions:
/// ```text
/// idle ──start──→ recording
///   ↑                 │
///   └──────stop───────┘
/// ```
/// `start` while recording and `stop` while idle are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        let state = RecorderState::default();
        assert!(state.is_idle());
        assert!(!state.is_recording());
        assert_eq!(state.as_str(), "idle");
    }
}
