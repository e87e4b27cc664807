use std::fmt;

/// Remaining seconds at or below which the countdown is in the warning band.
pub const WARNING_THRESHOLD_SECS: u64 = 300;
/// Remaining seconds at or below which the countdown is critical.
pub const CRITICAL_THRESHOLD_SECS: u64 = 60;

type ExpiryCallback = Box<dyn FnOnce() + Send + 'static>;

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { remaining: u64 },
    /// Returned by exactly one tick: the one that reached zero.
    Expired,
    /// The countdown already expired or was cancelled.
    Stopped,
}

/// Display urgency derived from the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    /// More than one and at most five minutes left.
    Warning,
    /// One minute or less left.
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Expired,
    Cancelled,
}

/// One-second-resolution countdown that expires exactly once.
///
/// The countdown does not own a clock; whoever drives the session calls
/// [`Countdown::tick`] once per second. The expiry callback is an `FnOnce`
/// taken out on the expiring tick, so it cannot run twice.
pub struct Countdown {
    duration_secs: u64,
    remaining_secs: u64,
    state: State,
    on_expire: Option<ExpiryCallback>,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            state: State::Running,
            on_expire: None,
        }
    }

    /// Attach the callback invoked when the countdown reaches zero.
    #[must_use]
    pub fn on_expire(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(callback));
        self
    }

    /// Advance by one second.
    ///
    /// A zero-length countdown expires on its first tick.
    pub fn tick(&mut self) -> Tick {
        if self.state != State::Running {
            return Tick::Stopped;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Tick::Running {
                remaining: self.remaining_secs,
            };
        }

        self.state = State::Expired;
        if let Some(callback) = self.on_expire.take() {
            callback();
        }
        Tick::Expired
    }

    /// Stop ticking without firing the expiry callback.
    pub fn cancel(&mut self) {
        if self.state == State::Running {
            self.state = State::Cancelled;
        }
        self.on_expire = None;
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.duration_secs - self.remaining_secs
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == State::Expired
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state == State::Cancelled
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        match self.remaining_secs {
            r if r <= CRITICAL_THRESHOLD_SECS => Urgency::Critical,
            r if r <= WARNING_THRESHOLD_SECS => Urgency::Warning,
            _ => Urgency::Normal,
        }
    }

    /// Share of the duration already used, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        if self.duration_secs == 0 {
            return 100.0;
        }
        self.elapsed_secs() as f64 / self.duration_secs as f64 * 100.0
    }

    /// Remaining time rendered with [`format_clock`].
    #[must_use]
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs)
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("duration_secs", &self.duration_secs)
            .field("remaining_secs", &self.remaining_secs)
            .field("state", &self.state)
            .field("has_callback", &self.on_expire.is_some())
            .finish()
    }
}

/// Render seconds as `h:mm:ss` when an hour or more is left, else `m:ss`.
#[must_use]
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(duration: u64) -> (Countdown, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&fired);
        let countdown = Countdown::new(duration).on_expire(move || {
            hook.fetch_add(1, Ordering::SeqCst);
        });
        (countdown, fired)
    }

    #[test]
    fn one_second_countdown_fires_on_first_tick() {
        let (mut countdown, fired) = counting(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn fires_exactly_once_after_duration_ticks() {
        let (mut countdown, fired) = counting(3);
        assert_eq!(countdown.tick(), Tick::Running { remaining: 2 });
        assert_eq!(countdown.tick(), Tick::Running { remaining: 1 });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert_eq!(countdown.tick(), Tick::Expired);
        for _ in 0..5 {
            assert_eq!(countdown.tick(), Tick::Stopped);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(countdown.is_expired());
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let (mut countdown, fired) = counting(0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_countdown_never_fires() {
        let (mut countdown, fired) = counting(2);
        countdown.tick();
        countdown.cancel();
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(countdown.is_cancelled());
        assert_eq!(countdown.remaining_secs(), 1);
    }

    #[test]
    fn urgency_bands() {
        let mut countdown = Countdown::new(302);
        assert_eq!(countdown.urgency(), Urgency::Normal);
        countdown.tick();
        assert_eq!(countdown.urgency(), Urgency::Normal);
        countdown.tick();
        assert_eq!(countdown.remaining_secs(), 300);
        assert_eq!(countdown.urgency(), Urgency::Warning);

        let mut countdown = Countdown::new(61);
        assert_eq!(countdown.urgency(), Urgency::Warning);
        countdown.tick();
        assert_eq!(countdown.urgency(), Urgency::Critical);
    }

    #[test]
    fn progress_tracks_elapsed_share() {
        let mut countdown = Countdown::new(4);
        countdown.tick();
        assert_eq!(countdown.elapsed_secs(), 1);
        assert!((countdown.progress_percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(61), "1:01");
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(5423), "1:30:23");
        assert_eq!(Countdown::new(2700).display(), "45:00");
    }
}
