//! The output sink contract and in-process sinks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tide_core::OutputError;

use crate::payload::Payload;

/// Destination for payloads produced by one writer schedule.
///
/// Sinks are written to only when their schedule is due and closed
/// exactly once at shutdown or early termination. A sink must accept
/// [`close`](OutputSink::close) after a failed write.
pub trait OutputSink: Send {
    /// Persist `payload`, produced by schedule `name` at simulation `time`
    /// seconds.
    ///
    /// # Errors
    ///
    /// Any [`OutputError`]; the driver treats it as fatal.
    fn write(&mut self, name: &str, payload: &Payload, time: f64) -> Result<(), OutputError>;

    /// Flush and finalize. Closing an already closed sink is a no-op.
    ///
    /// # Errors
    ///
    /// Any [`OutputError`] raised while flushing.
    fn close(&mut self) -> Result<(), OutputError>;
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write(&mut self, name: &str, payload: &Payload, time: f64) -> Result<(), OutputError> {
        (**self).write(name, payload, time)
    }

    fn close(&mut self) -> Result<(), OutputError> {
        (**self).close()
    }
}

/// A sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _name: &str, _payload: &Payload, _time: f64) -> Result<(), OutputError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// One payload captured by a [`MemorySink`].
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedFrame {
    /// Schedule name.
    pub name: String,
    /// Simulation time in seconds.
    pub time: f64,
    /// The payload as written.
    pub payload: Payload,
}

#[derive(Debug, Default)]
struct MemoryState {
    frames: Vec<CapturedFrame>,
    closed: bool,
}

/// Shared view of what a [`MemorySink`] has received.
///
/// Stays readable after the sink itself has been moved into a scheduler.
#[derive(Clone, Debug, Default)]
pub struct MemoryLog {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLog {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every captured payload in write order.
    pub fn frames(&self) -> Vec<CapturedFrame> {
        self.lock().frames.clone()
    }

    /// Number of payloads written.
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lock().frames.is_empty()
    }

    /// Simulation times of every write.
    pub fn times(&self) -> Vec<f64> {
        self.lock().frames.iter().map(|f| f.time).collect()
    }

    /// Whether the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// A sink that keeps every payload in memory.
///
/// ```
/// use tide_obs::{sink::MemorySink, OutputSink, Payload};
///
/// let (mut sink, log) = MemorySink::new();
/// sink.write("surface", &Payload::new(), 300.0).unwrap();
/// sink.close().unwrap();
/// assert_eq!(log.times(), vec![300.0]);
/// assert!(log.is_closed());
/// ```
#[derive(Debug)]
pub struct MemorySink {
    log: MemoryLog,
}

impl MemorySink {
    /// A new sink and a handle to its log.
    pub fn new() -> (Self, MemoryLog) {
        let log = MemoryLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, name: &str, payload: &Payload, time: f64) -> Result<(), OutputError> {
        let mut state = self.log.lock();
        if state.closed {
            return Err(OutputError::Closed {
                name: name.to_string(),
            });
        }
        state.frames.push(CapturedFrame {
            name: name.to_string(),
            time,
            payload: payload.clone(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), OutputError> {
        self.log.lock().closed = true;
        Ok(())
    }
}
