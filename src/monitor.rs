//! The polling loop: sample, print, show, sleep, until told to stop.

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info};

use crate::{
    config::{DEFAULT_BANNER, POLL_INTERVAL},
    display::DisplayLines,
    error::MonitorError,
    lcd::{DisplaySurface, Row},
    sensor::Sensor,
    shutdown::Shutdown,
};

pub const SHUTDOWN_NOTICE: &str = "\nKilling program";

/// Where the readings are echoed as text, one call per line.
pub trait Console {
    fn print(&mut self, line: &str) -> Result<(), MonitorError>;
}

pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&mut self, line: &str) -> Result<(), MonitorError> {
        writeln!(std::io::stdout().lock(), "{line}")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminating,
}

pub struct Monitor<S, D, C> {
    sensor: S,
    display: D,
    console: C,
    shutdown: Shutdown,
    banner: String,
    interval: Duration,
}

impl<S, D, C> Monitor<S, D, C>
where
    S: Sensor,
    D: DisplaySurface,
    C: Console,
{
    pub fn new(sensor: S, display: D, console: C, shutdown: Shutdown) -> Self {
        Self {
            sensor,
            display,
            console,
            shutdown,
            banner: DEFAULT_BANNER.to_string(),
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Runs until the shutdown token fires, then prints the notice and
    /// returns `Ok`. Any sensor, console or display error ends the loop and
    /// is handed back untouched.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        self.display.write_line(Row::First, &self.banner)?;
        info!("Polling every {:?}", self.interval);

        let mut state = LoopState::Running;
        loop {
            state = match state {
                LoopState::Running => self.tick().await?,
                LoopState::Terminating => {
                    self.console.print(SHUTDOWN_NOTICE)?;
                    info!("Monitor stopped");
                    return Ok(());
                }
            };
        }
    }

    async fn tick(&mut self) -> Result<LoopState, MonitorError> {
        // Lets a pending interrupt listener run before the blocking read.
        tokio::task::yield_now().await;
        if self.shutdown.is_triggered() {
            return Ok(LoopState::Terminating);
        }

        let reading = self.sensor.sample()?;
        let lines = DisplayLines::from(&reading);
        debug!("Rendering {reading}");

        self.console.print(&lines.line1)?;
        self.console.print(&lines.line2)?;
        self.display.write_line(Row::First, &lines.line1)?;
        self.display.write_line(Row::Second, &lines.line2)?;

        tokio::select! {
            _ = tokio::time::sleep(self.interval) => Ok(LoopState::Running),
            _ = self.shutdown.wait() => Ok(LoopState::Terminating),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use tokio::time::Instant;

    use super::*;
    use crate::Reading;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Sample,
        Print(String),
        Show(Row, String),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct ScriptedSensor {
        script: VecDeque<Result<Reading, MonitorError>>,
        log: Log,
        stop_when_empty: Shutdown,
    }

    impl Sensor for ScriptedSensor {
        fn sample(&mut self) -> Result<Reading, MonitorError> {
            self.log.borrow_mut().push(Event::Sample);
            let next = self
                .script
                .pop_front()
                .unwrap_or_else(|| Ok(Reading::new(20.0, 50.0, 1000.0)));
            if self.script.is_empty() {
                self.stop_when_empty.trigger();
            }
            next
        }
    }

    struct Recorder(Log);

    impl Console for Recorder {
        fn print(&mut self, line: &str) -> Result<(), MonitorError> {
            self.0.borrow_mut().push(Event::Print(line.to_string()));
            Ok(())
        }
    }

    impl DisplaySurface for Recorder {
        fn write_line(&mut self, row: Row, text: &str) -> Result<(), MonitorError> {
            self.0.borrow_mut().push(Event::Show(row, text.to_string()));
            Ok(())
        }
    }

    struct Harness {
        log: Log,
        shutdown: Shutdown,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                log: Rc::new(RefCell::new(Vec::new())),
                shutdown: Shutdown::new(),
            }
        }

        /// Sensor that plays `script` and requests a stop on its last entry.
        fn monitor(
            &self,
            script: Vec<Result<Reading, MonitorError>>,
        ) -> Monitor<ScriptedSensor, Recorder, Recorder> {
            let sensor = ScriptedSensor {
                script: script.into(),
                log: self.log.clone(),
                stop_when_empty: self.shutdown.clone(),
            };
            Monitor::new(
                sensor,
                Recorder(self.log.clone()),
                Recorder(self.log.clone()),
                self.shutdown.clone(),
            )
            .with_banner("Hello")
        }

        fn events(&self) -> Vec<Event> {
            self.log.borrow().clone()
        }

        fn count(&self, wanted: fn(&Event) -> bool) -> usize {
            self.log.borrow().iter().filter(|e| wanted(e)).count()
        }
    }

    fn steady(cycles: usize) -> Vec<Result<Reading, MonitorError>> {
        (0..cycles)
            .map(|_| Ok(Reading::new(1.0, 2.0, 3.0)))
            .collect()
    }

    fn print(line: &str) -> Event {
        Event::Print(line.to_string())
    }

    fn show(row: Row, line: &str) -> Event {
        Event::Show(row, line.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn renders_each_cycle_console_first() {
        let harness = Harness::new();
        let monitor = harness.monitor(vec![
            Ok(Reading::new(25.004, 60.2, 1013.251)),
            Ok(Reading::new(25.006, 60.25, 1013.255)),
        ]);

        monitor.run().await.unwrap();

        assert_eq!(
            harness.events(),
            vec![
                show(Row::First, "Hello"),
                Event::Sample,
                print("T:25.00 U:60.20"),
                print("P:1013.25"),
                show(Row::First, "T:25.00 U:60.20"),
                show(Row::Second, "P:1013.25"),
                Event::Sample,
                print("T:25.01 U:60.25"),
                print("P:1013.25"),
                show(Row::First, "T:25.01 U:60.25"),
                show(Row::Second, "P:1013.25"),
                print(SHUTDOWN_NOTICE),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_sleep_stops_without_another_read() {
        let harness = Harness::new();
        // Long script so the sensor never requests the stop itself.
        let monitor = harness.monitor(steady(10));

        let shutdown = harness.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1_500)).await;
            shutdown.trigger();
        });

        let started = Instant::now();
        monitor.run().await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(harness.count(|e| matches!(e, Event::Sample)), 2);
        assert_eq!(
            harness.count(|e| matches!(e, Event::Print(l) if l == SHUTDOWN_NOTICE)),
            1
        );
        assert_eq!(harness.events().last(), Some(&print(SHUTDOWN_NOTICE)));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_one_interval_between_reads() {
        let harness = Harness::new();
        let monitor = harness.monitor(steady(3));

        let started = Instant::now();
        monitor.run().await.unwrap();

        // Third read requests the stop, which cuts its sleep short.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
        assert_eq!(harness.count(|e| matches!(e, Event::Sample)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_ends_the_loop() {
        let harness = Harness::new();
        let monitor = harness.monitor(vec![
            Ok(Reading::new(21.0, 40.0, 990.0)),
            Err(MonitorError::Transport("bus gone".to_string())),
            Ok(Reading::new(21.0, 40.0, 990.0)),
        ]);

        let result = monitor.run().await;

        assert!(matches!(result, Err(MonitorError::Transport(msg)) if msg == "bus gone"));
        assert_eq!(harness.count(|e| matches!(e, Event::Sample)), 2);
        assert_eq!(harness.count(|e| matches!(e, Event::Print(_))), 2);
        assert_eq!(harness.count(|e| matches!(e, Event::Show(..))), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_interrupt_wins_over_the_first_read() {
        let harness = Harness::new();
        let monitor = harness.monitor(steady(3));
        // Spawned but not yet polled, like a listener that caught SIGINT
        // while the bus was still being set up.
        let shutdown = harness.shutdown.clone();
        tokio::spawn(async move { shutdown.trigger() });

        monitor.run().await.unwrap();

        assert_eq!(
            harness.events(),
            vec![show(Row::First, "Hello"), print(SHUTDOWN_NOTICE)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_requested_before_start_reads_nothing() {
        let harness = Harness::new();
        let monitor = harness.monitor(steady(2));
        harness.shutdown.trigger();

        monitor.run().await.unwrap();

        assert_eq!(
            harness.events(),
            vec![show(Row::First, "Hello"), print(SHUTDOWN_NOTICE)]
        );
    }
}
