/// Track state enumeration for object tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not yet matched `min_hits` times in a row
    #[default]
    Tentative,
    /// Matched at least `min_hits` consecutive frames
    Confirmed,
    /// Missed one or more recent frames, surviving on prediction alone
    Coasting,
    /// Unmatched for longer than `max_age`, about to be removed
    Dead,
}

impl TrackState {
    #[inline]
    pub fn is_alive(self) -> bool {
        self != TrackState::Dead
    }
}
