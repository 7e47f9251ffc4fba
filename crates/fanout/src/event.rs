use core::fmt;

/// An opaque identifier for one unit of work.
///
/// Events are created by the event source, are immutable, and are consumed
/// exactly once by exactly one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Event(u64);

impl Event {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl From<u64> for Event {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<Event> for u64 {
    fn from(event: Event) -> Self {
        event.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}
