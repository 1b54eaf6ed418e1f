use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::coach::{self, Advisor};
use crate::generator::ContentGenerator;
use crate::sequence::Sequence;
use crate::session::{AdviceRequest, GenerationRequest, RunId};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A background generation finished.
    Generated { run_id: RunId, sequence: Sequence },
    /// A background coaching request finished.
    Advice { run_id: RunId, text: String },
}

/// Source of events for the runner: terminal input plus background job results.
pub trait DrillEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<DrillEvent>,
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => input_tx.send(DrillEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => input_tx.send(DrillEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::warn!(%err, "terminal input closed");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    /// Handle for background jobs to post their results.
    pub fn sender(&self) -> Sender<DrillEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source fed by a plain channel
pub struct TestEventSource {
    rx: Receiver<DrillEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self { rx }
    }
}

impl DrillEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: DrillEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: DrillEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> DrillEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                DrillEvent::Tick
            }
        }
    }
}

/// Runs generation and coaching on worker threads. Results come back as
/// events carrying the run id they were started for.
#[derive(Clone)]
pub struct Jobs {
    tx: Sender<DrillEvent>,
    generator: Arc<ContentGenerator>,
    advisor: Arc<dyn Advisor>,
}

impl Jobs {
    pub fn new(
        tx: Sender<DrillEvent>,
        generator: Arc<ContentGenerator>,
        advisor: Arc<dyn Advisor>,
    ) -> Self {
        Self {
            tx,
            generator,
            advisor,
        }
    }

    pub fn generate(&self, req: GenerationRequest) {
        let tx = self.tx.clone();
        let generator = Arc::clone(&self.generator);
        std::thread::spawn(move || {
            let sequence = generator.generate(
                req.discipline,
                req.quantity,
                req.locale,
                &mut rand::thread_rng(),
            );
            if tx
                .send(DrillEvent::Generated {
                    run_id: req.run_id,
                    sequence,
                })
                .is_err()
            {
                tracing::debug!(run_id = req.run_id, "event loop gone before generation finished");
            }
        });
    }

    pub fn advise(&self, req: AdviceRequest) {
        let tx = self.tx.clone();
        let advisor = Arc::clone(&self.advisor);
        std::thread::spawn(move || {
            let text = coach::advise_or_fallback(
                advisor.as_ref(),
                &req.sequence,
                req.discipline.label(),
                req.locale,
            );
            if tx
                .send(DrillEvent::Advice {
                    run_id: req.run_id,
                    text,
                })
                .is_err()
            {
                tracing::debug!(run_id = req.run_id, "event loop gone before advice arrived");
            }
        });
    }
}
