//! Multi-rate writer scheduling.
//!
//! Each [`WriterSchedule`] fires on a fixed nominal cadence in simulation
//! time: `interval, 2·interval, 3·interval, ...`. The cadence is never
//! re-based to the poll time, so a late poll does not shift later fires.

use std::collections::HashSet;

use tide_core::{ConfigError, FieldReader, OutputError};
use tide_grid::GridDescriptor;

use crate::plan::OutputPlan;
use crate::sink::OutputSink;
use crate::spec::OutputSpec;

/// Relative slack applied to due checks, as a fraction of the interval.
///
/// Absorbs floating-point drift in the accumulated simulation clock so a
/// schedule at `t = 3·interval` is not missed because the clock reads
/// `3·interval − ε`.
pub const DUE_TOLERANCE: f64 = 1e-9;

/// One named writer: an interval, a compiled selector, and a sink.
pub struct WriterSchedule {
    name: String,
    interval: f64,
    plan: OutputPlan,
    sink: Box<dyn OutputSink>,
    next_fire_time: f64,
    fires: u64,
    closed: bool,
}

impl WriterSchedule {
    /// Compile `spec` against `grid` and bind it to `sink`.
    ///
    /// The first fire is due at `t = interval`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonPositive`] for a bad interval,
    /// [`ConfigError::EmptyOutput`] if `spec` has no entries, or any plan
    /// compilation error.
    pub fn new(
        name: impl Into<String>,
        interval: f64,
        spec: &OutputSpec,
        grid: &GridDescriptor,
        sink: Box<dyn OutputSink>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if !(interval.is_finite() && interval > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "output interval",
                value: interval,
            });
        }
        if spec.entries.is_empty() {
            return Err(ConfigError::EmptyOutput { name });
        }
        let plan = OutputPlan::compile(spec, grid)?;
        Ok(Self {
            name,
            interval,
            plan,
            sink,
            next_fire_time: interval,
            fires: 0,
            closed: false,
        })
    }

    /// Schedule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cadence in simulation seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Simulation time of the next fire.
    pub fn next_fire_time(&self) -> f64 {
        self.next_fire_time
    }

    /// Number of completed fires.
    pub fn fires(&self) -> u64 {
        self.fires
    }

    /// Whether the schedule is due at time `t`.
    pub fn is_due(&self, t: f64) -> bool {
        t + DUE_TOLERANCE * self.interval >= self.next_fire_time
    }

    fn fire(&mut self, t: f64, reader: &dyn FieldReader) -> Result<(), OutputError> {
        if t >= self.next_fire_time + self.interval {
            tracing::warn!(
                schedule = %self.name,
                time = t,
                due = self.next_fire_time,
                "output is more than one interval late"
            );
        }
        let payload = self.plan.execute(reader)?;
        self.sink.write(&self.name, &payload, t)?;
        self.next_fire_time += self.interval;
        self.fires += 1;
        tracing::debug!(
            schedule = %self.name,
            time = t,
            arrays = payload.len(),
            next = self.next_fire_time,
            "output fired"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), OutputError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close()
    }
}

impl std::fmt::Debug for WriterSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSchedule")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("next_fire_time", &self.next_fire_time)
            .field("fires", &self.fires)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of writer schedules polled once per outer iteration.
///
/// # Examples
///
/// ```
/// use tide_core::Field;
/// use tide_grid::GridDescriptor;
/// use tide_obs::{sink::MemorySink, OutputScheduler, OutputSpec, WriterSchedule};
/// use tide_test_utils::MockFieldReader;
///
/// let grid = GridDescriptor::new([2, 2, 2], [2.0, 2.0, 2.0]).unwrap();
/// let mut fields = MockFieldReader::new();
/// fields.set_field(Field::Temperature, vec![0.0; 8]);
///
/// let (sink, log) = MemorySink::new();
/// let spec = OutputSpec::full_fields(&[Field::Temperature]);
/// let mut scheduler = OutputScheduler::new();
/// scheduler
///     .register(WriterSchedule::new("fields", 300.0, &spec, &grid, Box::new(sink)).unwrap())
///     .unwrap();
///
/// assert_eq!(scheduler.poll(0.0, &fields).unwrap(), 0);
/// assert_eq!(scheduler.poll(290.0, &fields).unwrap(), 0);
/// assert_eq!(scheduler.poll(310.0, &fields).unwrap(), 1);
/// assert_eq!(scheduler.schedules()[0].next_fire_time(), 600.0);
/// assert_eq!(log.times(), vec![310.0]);
/// ```
#[derive(Debug, Default)]
pub struct OutputScheduler {
    schedules: Vec<WriterSchedule>,
    names: HashSet<String>,
}

impl OutputScheduler {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a schedule. Fires happen in registration order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateName`] if a schedule of that name exists.
    pub fn register(&mut self, schedule: WriterSchedule) -> Result<(), ConfigError> {
        if !self.names.insert(schedule.name.clone()) {
            return Err(ConfigError::DuplicateName {
                name: schedule.name.clone(),
            });
        }
        tracing::debug!(
            schedule = %schedule.name,
            interval = schedule.interval,
            arrays = schedule.plan.len(),
            "output schedule registered"
        );
        self.schedules.push(schedule);
        Ok(())
    }

    /// Fire every schedule due at time `t`, each at most once.
    ///
    /// Returns the number of schedules fired. Polling when nothing is due
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// The first selector or sink error. Schedules after the failing one
    /// are not fired.
    pub fn poll(&mut self, t: f64, reader: &dyn FieldReader) -> Result<usize, OutputError> {
        let mut fired = 0;
        for schedule in self.schedules.iter_mut().filter(|s| !s.closed) {
            if schedule.is_due(t) {
                schedule.fire(t, reader)?;
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Close every sink, even if some fail.
    ///
    /// # Errors
    ///
    /// The first close failure; later failures are logged.
    pub fn close_all(&mut self) -> Result<(), OutputError> {
        let mut first = None;
        for schedule in &mut self.schedules {
            if let Err(e) = schedule.close() {
                tracing::warn!(schedule = %schedule.name, error = %e, "closing output failed");
                first.get_or_insert(e);
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Registered schedules in registration order.
    pub fn schedules(&self) -> &[WriterSchedule] {
        &self.schedules
    }

    /// Number of registered schedules.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Whether no schedules are registered.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::payload::Payload;
    use crate::sink::{MemoryLog, MemorySink};
    use crate::spec::OutputEntry;
    use tide_core::Field;
    use tide_grid::Axis;
    use tide_test_utils::MockFieldReader;

    fn grid() -> GridDescriptor {
        GridDescriptor::new([2, 2, 2], [2.0, 2.0, 2.0]).unwrap()
    }

    fn reader() -> MockFieldReader {
        let mut r = MockFieldReader::new();
        r.set_field(Field::Temperature, (0..8u32).map(f64::from).collect());
        r.set_field(Field::Viscosity, vec![1e-3; 8]);
        r
    }

    fn schedule(name: &str, interval: f64) -> (WriterSchedule, MemoryLog) {
        let (sink, log) = MemorySink::new();
        let spec = OutputSpec::full_fields(&[Field::Temperature]);
        let s = WriterSchedule::new(name, interval, &spec, &grid(), Box::new(sink)).unwrap();
        (s, log)
    }

    struct FailingSink {
        fail_write: bool,
        closed: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl OutputSink for FailingSink {
        fn write(&mut self, _: &str, _: &Payload, _: f64) -> Result<(), OutputError> {
            if self.fail_write {
                return Err(std::io::Error::other("disk full").into());
            }
            Ok(())
        }

        fn close(&mut self) -> Result<(), OutputError> {
            self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
            Err(std::io::Error::other("close failed").into())
        }
    }

    #[test]
    fn poll_example_300s() {
        let (s, log) = schedule("fields", 300.0);
        let mut sched = OutputScheduler::new();
        sched.register(s).unwrap();
        let r = reader();
        assert_eq!(sched.poll(0.0, &r).unwrap(), 0);
        assert_eq!(sched.poll(290.0, &r).unwrap(), 0);
        assert_eq!(sched.poll(310.0, &r).unwrap(), 1);
        assert_eq!(sched.schedules()[0].next_fire_time(), 600.0);
        assert_eq!(sched.schedules()[0].fires(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn fires_at_most_once_per_poll_and_keeps_cadence() {
        let (s, log) = schedule("fields", 100.0);
        let mut sched = OutputScheduler::new();
        sched.register(s).unwrap();
        let r = reader();
        // Far past several due times: one fire, cadence advances by one.
        assert_eq!(sched.poll(350.0, &r).unwrap(), 1);
        assert_eq!(sched.schedules()[0].next_fire_time(), 200.0);
        assert_eq!(sched.poll(350.0, &r).unwrap(), 1);
        assert_eq!(sched.poll(350.0, &r).unwrap(), 1);
        assert_eq!(sched.poll(350.0, &r).unwrap(), 0);
        assert_eq!(sched.schedules()[0].next_fire_time(), 400.0);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn tolerance_absorbs_clock_drift() {
        let (s, log) = schedule("fields", 0.1);
        let mut sched = OutputScheduler::new();
        sched.register(s).unwrap();
        let r = reader();
        // Ten sub-steps of 0.01 sum to slightly less than 0.1.
        let mut t = 0.0;
        let mut fired_at = Vec::new();
        for tick in 1..=30 {
            t += 0.01;
            if sched.poll(t, &r).unwrap() == 1 {
                fired_at.push(tick);
            }
        }
        assert_eq!(fired_at, vec![10, 20, 30]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn due_schedules_fire_in_registration_order() {
        let (sink, log) = MemorySink::new();
        let shared: Box<dyn OutputSink> = Box::new(sink);
        let spec = OutputSpec::new(vec![OutputEntry::maximum(Field::Viscosity)]);
        let fast = WriterSchedule::new("fast", 60.0, &spec, &grid(), shared).unwrap();
        let (slow, slow_log) = schedule("slow", 120.0);

        let mut sched = OutputScheduler::new();
        sched.register(fast).unwrap();
        sched.register(slow).unwrap();
        let r = reader();
        assert_eq!(sched.poll(60.0, &r).unwrap(), 1);
        assert_eq!(sched.poll(120.0, &r).unwrap(), 2);
        assert_eq!(log.len(), 2);
        assert_eq!(slow_log.len(), 1);
        assert_eq!(log.frames()[1].payload.get("max_nu").unwrap().data, vec![1e-3]);
    }

    #[test]
    fn duplicate_schedule_names_rejected() {
        let mut sched = OutputScheduler::new();
        sched.register(schedule("a", 1.0).0).unwrap();
        match sched.register(schedule("a", 2.0).0) {
            Err(ConfigError::DuplicateName { name }) => assert_eq!(name, "a"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn bad_interval_and_empty_spec_rejected() {
        let spec = OutputSpec::full_fields(&[Field::Temperature]);
        assert!(matches!(
            WriterSchedule::new("x", 0.0, &spec, &grid(), Box::new(crate::NullSink)),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            WriterSchedule::new("x", f64::NAN, &spec, &grid(), Box::new(crate::NullSink)),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            WriterSchedule::new("x", 1.0, &OutputSpec::default(), &grid(), Box::new(crate::NullSink)),
            Err(ConfigError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn slice_out_of_bounds_rejected_at_registration() {
        let spec = OutputSpec::new(vec![OutputEntry::slice(Field::Temperature, Axis::Y, 2)]);
        assert!(matches!(
            WriterSchedule::new("x", 1.0, &spec, &grid(), Box::new(crate::NullSink)),
            Err(ConfigError::SliceOutOfBounds { .. })
        ));
    }

    #[test]
    fn write_failure_propagates() {
        let closed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let sink = FailingSink {
            fail_write: true,
            closed: closed.clone(),
        };
        let spec = OutputSpec::full_fields(&[Field::Temperature]);
        let mut sched = OutputScheduler::new();
        sched
            .register(WriterSchedule::new("x", 1.0, &spec, &grid(), Box::new(sink)).unwrap())
            .unwrap();
        assert!(matches!(sched.poll(1.0, &reader()), Err(OutputError::Io(_))));
        assert_eq!(sched.schedules()[0].fires(), 0);
    }

    #[test]
    fn close_all_closes_every_sink_and_reports_first_failure() {
        let closed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let failing = FailingSink {
            fail_write: false,
            closed: closed.clone(),
        };
        let spec = OutputSpec::full_fields(&[Field::Temperature]);
        let (good, log) = schedule("good", 1.0);
        let mut sched = OutputScheduler::new();
        sched
            .register(WriterSchedule::new("bad", 1.0, &spec, &grid(), Box::new(failing)).unwrap())
            .unwrap();
        sched.register(good).unwrap();

        let err = sched.close_all().unwrap_err();
        assert!(err.to_string().contains("close failed"));
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
        assert!(log.is_closed());

        // Closed schedules are skipped by later polls and closes.
        assert_eq!(sched.poll(10.0, &reader()).unwrap(), 0);
        assert!(sched.close_all().is_ok());
    }

    proptest! {
        #[test]
        fn cadence_is_fixed_and_fires_once_per_poll(
            interval in 1u32..500,
            steps in prop::collection::vec(0.0f64..2000.0, 1..40),
        ) {
            let interval = f64::from(interval);
            let (s, log) = schedule("fields", interval);
            let mut sched = OutputScheduler::new();
            sched.register(s).unwrap();
            let r = reader();
            let mut t = 0.0;
            for step in steps {
                t += step;
                let fired = sched.poll(t, &r).unwrap();
                prop_assert!(fired <= 1);
                let s = &sched.schedules()[0];
                prop_assert_eq!(s.next_fire_time(), interval * (s.fires() + 1) as f64);
                if fired == 1 {
                    prop_assert!(s.next_fire_time() - interval <= t + DUE_TOLERANCE * interval);
                }
            }
            prop_assert_eq!(log.len() as u64, sched.schedules()[0].fires());
        }
    }
}
