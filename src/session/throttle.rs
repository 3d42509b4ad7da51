/// Coalesces a stream of values into at most one delivery per interval.
///
/// The first value after a quiet period is delivered immediately; values
/// arriving inside the interval replace a single trailing slot that the
/// embedder's timer drains with [`Throttle::flush`].
#[derive(Debug)]
pub struct Throttle<T> {
    interval_ms: f64,
    last_delivery_ms: Option<f64>,
    trailing: Option<T>,
    cancelled: bool,
}

impl<T> Throttle<T> {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms as f64,
            last_delivery_ms: None,
            trailing: None,
            cancelled: false,
        }
    }

    /// Returns the value when it should be handled now.
    pub fn offer(&mut self, now_ms: f64, value: T) -> Option<T> {
        if self.cancelled {
            return None;
        }
        match self.last_delivery_ms {
            Some(last) if now_ms - last < self.interval_ms => {
                self.trailing = Some(value);
                None
            }
            _ => {
                self.last_delivery_ms = Some(now_ms);
                self.trailing = None;
                Some(value)
            }
        }
    }

    pub fn has_trailing(&self) -> bool {
        self.trailing.is_some()
    }

    pub fn flush(&mut self, now_ms: f64) -> Option<T> {
        let value = self.trailing.take()?;
        self.last_delivery_ms = Some(now_ms);
        Some(value)
    }

    /// Drops the trailing value and refuses everything offered afterwards.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.trailing = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
