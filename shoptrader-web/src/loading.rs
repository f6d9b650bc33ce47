//! Loading overlay timing and status lines.
use serde::Serialize;
use shoptrader_game::Variant;
use shoptrader_game::constants::MIN_LOADING_TIME;
use std::time::Duration;

/// Boot step shown on the loading overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStage {
    Connecting,
    Unpacking,
    Opening,
    Welcome,
}

impl LoadingStage {
    #[must_use]
    pub const fn message(self, variant: Variant) -> &'static str {
        match (self, variant) {
            (Self::Connecting, Variant::BookTrader) => "Connecting to the book network",
            (Self::Connecting, Variant::GameTrader) => "Connecting to the game network",
            (Self::Unpacking, Variant::BookTrader) => "Unpacking books",
            (Self::Unpacking, Variant::GameTrader) => "Unpacking games",
            (Self::Opening, Variant::BookTrader) => "The bookshop is opening",
            (Self::Opening, Variant::GameTrader) => "The game store is opening",
            (Self::Welcome, _) => "Welcome",
        }
    }
}

/// Tracks when the overlay appeared so it stays up for a minimum time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingClock {
    started_ms: f64,
}

impl LoadingClock {
    #[must_use]
    pub const fn started_at(started_ms: f64) -> Self {
        Self { started_ms }
    }

    /// Time left before the overlay may close, zero once the minimum passed.
    #[must_use]
    pub fn remaining(&self, now_ms: f64) -> Duration {
        Duration::from_secs_f64(remaining_loading_ms(self.started_ms, now_ms) / 1_000.0)
    }
}

/// `max(MIN_LOADING_TIME - elapsed, 0)` in milliseconds. A clock running
/// backwards counts as no time elapsed.
#[must_use]
pub fn remaining_loading_ms(started_ms: f64, now_ms: f64) -> f64 {
    let elapsed = (now_ms - started_ms).max(0.0);
    let min_ms = MIN_LOADING_TIME.as_secs_f64() * 1_000.0;
    (min_ms - elapsed).max(0.0)
}
