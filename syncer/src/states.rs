/// Syncer lifecycle state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not running. Initial state and the state after a completed stop.
    Stopped,

    /// Background catch-up loop is running and gossip headers are accepted.
    Running,

    /// Stop requested; waiting for the loop to reach a safe checkpoint.
    Stopping,
}

impl SyncState {
    /// Check if a transition to the target state is valid.
    ///
    /// `Stopped -> Stopped` is allowed so a failed start can roll back.
    pub fn can_transition_to(&self, target: SyncState) -> bool {
        match self {
            SyncState::Stopped => matches!(target, SyncState::Running | SyncState::Stopped),
            SyncState::Running => matches!(target, SyncState::Stopping | SyncState::Stopped),
            SyncState::Stopping => matches!(target, SyncState::Stopped),
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Stopped
    }
}
