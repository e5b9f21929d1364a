use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Error returned when a load is cancelled at a checkpoint.
///
/// Decode loops call [`Checkpoint::tick`] once per element and propagate this
/// error with `?` to stop at the next check.
///
/// # Example
///
/// ```ignore
/// let mut checkpoint = Checkpoint::new(Some(token), 1024);
/// for i in 0..count {
///     checkpoint.tick()?;
///     decode_element(i);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("load cancelled")]
pub struct Cancelled;

/// Token that signals cancellation to an in-progress load.
///
/// Cloning a token creates another handle to the same cancellation flag.
/// Calling [`cancel()`](CancellationToken::cancel) on any clone affects all.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new cancellation token (not cancelled).
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic cancellation check for per-element loops.
///
/// Loading the atomic flag on every vertex is wasted work, so the token is
/// only consulted once every `interval` ticks. An interval of 0 is treated
/// as 1.
pub struct Checkpoint {
    token: Option<CancellationToken>,
    interval: usize,
    counter: usize,
}

impl Checkpoint {
    /// Creates a checkpoint that checks `token` every `interval` ticks.
    pub fn new(token: Option<CancellationToken>, interval: usize) -> Self {
        Self {
            token,
            interval: interval.max(1),
            counter: 0,
        }
    }

    /// Creates a checkpoint that never cancels.
    pub fn never() -> Self {
        Self::new(None, usize::MAX)
    }

    /// Advances the counter and returns `Err(Cancelled)` if the token fired.
    ///
    /// The first tick always checks, so a token cancelled before the loop
    /// starts stops it before any work is done.
    #[inline]
    pub fn tick(&mut self) -> Result<(), Cancelled> {
        let check = self.counter == 0;
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
        }
        if check
            && let Some(token) = &self.token
            && token.is_cancelled()
        {
            return Err(Cancelled);
        }
        Ok(())
    }

    /// Checks the token immediately, regardless of the interval.
    pub fn check_now(&self) -> Result<(), Cancelled> {
        match &self.token {
            Some(token) if token.is_cancelled() => Err(Cancelled),
            _ => Ok(()),
        }
    }
}
