use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent};

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(u16, u16),
}

/// Pumps crossterm input onto a channel from a background thread.
///
/// Ticks are driven by a deadline rather than by poll timeouts, so they
/// keep arriving even while keystrokes stream in. Time-based UI state
/// (the footer notice) depends on that.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut next_tick = Instant::now() + tick_rate;
            loop {
                let wait = next_tick.saturating_duration_since(Instant::now());
                if event::poll(wait).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(Event::Key(key)) => tx.send(AppEvent::Key(key)),
                        Ok(Event::Resize(w, h)) => tx.send(AppEvent::Resize(w, h)),
                        _ => Ok(()),
                    };
                    if forwarded.is_err() {
                        return;
                    }
                }
                if Instant::now() >= next_tick {
                    if tx.send(AppEvent::Tick).is_err() {
                        return;
                    }
                    next_tick = Instant::now() + tick_rate;
                }
            }
        });
        Self { rx }
    }

    /// Blocks for the next event. Fails only once the reader thread is gone,
    /// which the main loop treats as a reason to exit.
    pub fn next(&self) -> anyhow::Result<AppEvent> {
        self.rx.recv().map_err(Into::into)
    }
}
