use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent};

pub enum AppEvent {
    Key(KeyEvent),
    /// One per `tick_rate`, regardless of how much input arrives.
    Tick,
    /// Terminal focus changed; `false` means the game is in the background.
    Focus(bool),
    Resize,
}

/// Tick deadline. A late tick reschedules from when it fired, so a stalled
/// thread sends one tick rather than a burst.
struct TickClock {
    next: Instant,
    rate: Duration,
}

impl TickClock {
    fn new(now: Instant, rate: Duration) -> Self {
        Self {
            next: now + rate,
            rate,
        }
    }

    fn timeout(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    fn due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.rate;
        true
    }
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let _tx = tx.clone();

        thread::spawn(move || {
            let mut clock = TickClock::new(Instant::now(), tick_rate);
            loop {
                if event::poll(clock.timeout(Instant::now())).unwrap_or(false) {
                    let app_event = match event::read() {
                        Ok(Event::Key(key)) => Some(AppEvent::Key(key)),
                        Ok(Event::FocusGained) => Some(AppEvent::Focus(true)),
                        Ok(Event::FocusLost) => Some(AppEvent::Focus(false)),
                        Ok(Event::Resize(..)) => Some(AppEvent::Resize),
                        _ => None,
                    };
                    if let Some(app_event) = app_event
                        && tx.send(app_event).is_err()
                    {
                        return;
                    }
                }
                if clock.due(Instant::now()) && tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, _tx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_due_once_per_rate() {
        let start = Instant::now();
        let rate = Duration::from_secs(1);
        let mut clock = TickClock::new(start, rate);

        assert!(!clock.due(start + Duration::from_millis(400)));
        let half = Duration::from_millis(500);
        assert_eq!(clock.timeout(start + half), half);
        assert!(clock.due(start + rate));
        assert!(!clock.due(start + rate));
    }

    #[test]
    fn stalled_clock_does_not_burst() {
        let start = Instant::now();
        let rate = Duration::from_secs(1);
        let mut clock = TickClock::new(start, rate);

        let late = start + Duration::from_secs(30);
        assert!(clock.due(late));
        assert!(!clock.due(late));
        assert!(!clock.due(late + Duration::from_millis(999)));
        assert!(clock.due(late + rate));
    }
}
