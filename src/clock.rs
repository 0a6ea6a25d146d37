use time::{Date, OffsetDateTime, UtcOffset};

/// Source of "now", so date-dependent behavior is reproducible in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Calendar date in the clock's offset.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock seen from the users' local offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: OffsetDateTime,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self { now }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now
    }
}
