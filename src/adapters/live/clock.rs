//! Live adapter for the `Clock` port.

use chrono::{DateTime, Utc};

use crate::ports::Clock;

/// Wall-clock time used to stamp recycle-bin entries.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_wall_clock() {
        let before = Utc::now();
        let stamped = LiveClock.now();
        assert!(stamped >= before);
        assert!(stamped <= Utc::now());
    }
}
