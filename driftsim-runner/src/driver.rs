use crossbeam_channel::Receiver;
use driftsim_core::SimState;
use driftsim_simulation::Pipeline;
use driftsim_transport::Renderer;
use hdrhistogram::Histogram;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};

/// Drives the simulation: fires one advance + render per tick at a fixed
/// cadence, and owns the state for its whole lifetime. Strictly
/// single-threaded; the only outside signal is the optional shutdown
/// channel polled between ticks.
pub struct Driver<R: Rng = StdRng> {
    state: SimState<R>,
    pipeline: Pipeline<R>,
    renderer: Box<dyn Renderer>,
    tick: Duration,
    running: bool,
    shutdown: Option<Receiver<()>>,
    tick_times: Histogram<u64>,
}

impl<R: Rng> Driver<R> {
    pub fn new(
        state: SimState<R>,
        pipeline: Pipeline<R>,
        renderer: Box<dyn Renderer>,
        tick: Duration,
    ) -> Self {
        Driver {
            state,
            pipeline,
            renderer,
            tick,
            running: false,
            shutdown: None,
            tick_times: Histogram::new(3).expect("3 significant digits is a valid precision"),
        }
    }

    /// Installs a channel the run loop polls between ticks; a message on it
    /// ends the loop.
    pub fn set_shutdown(&mut self, receiver: Receiver<()>) {
        self.shutdown = Some(receiver);
    }

    /// One tick: advance the state through the pipeline, then hand the new
    /// snapshot to the renderer. Renderer failures are logged, not fatal.
    pub fn step(&mut self) {
        self.pipeline.advance(&mut self.state);
        if let Err(e) = self.renderer.render(self.state.snapshot()) {
            error!("render failed: {}", e);
        }
    }

    /// Runs ticks at the configured cadence until stopped, interrupted, or
    /// `max_ticks` is reached.
    pub fn start(&mut self, max_ticks: Option<u64>) {
        self.running = true;
        let sleeper = SpinSleeper::default();
        let mut ticks = 0u64;
        info!("driver started, tick cadence {:?}", self.tick);

        while self.running {
            let frame_start = Instant::now();
            self.step();
            ticks += 1;

            let elapsed = frame_start.elapsed();
            self.tick_times.saturating_record(elapsed.as_micros() as u64);

            if let Some(limit) = max_ticks {
                if ticks >= limit {
                    break;
                }
            }
            if self.shutdown_requested() {
                break;
            }

            if elapsed < self.tick {
                sleeper.sleep(self.tick - elapsed);
            } else if !self.tick.is_zero() {
                warn!("tick overran budget: {:?} > {:?}", elapsed, self.tick);
            }
        }

        self.running = false;
        info!("driver stopped after {} ticks", ticks);
        self.log_tick_stats();
    }

    /// Halts the run loop. Idempotent; a no-op when already stopped.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Clears the simulation back to its initial state, then renders the
    /// empty snapshot once.
    pub fn reset(&mut self) {
        self.state.reset();
        if let Err(e) = self.renderer.render(self.state.snapshot()) {
            error!("render failed: {}", e);
        }
    }

    pub fn state(&self) -> &SimState<R> {
        &self.state
    }

    fn shutdown_requested(&self) -> bool {
        match &self.shutdown {
            Some(rx) => rx.try_recv().is_ok(),
            None => false,
        }
    }

    fn log_tick_stats(&self) {
        if self.tick_times.len() == 0 {
            return;
        }
        info!(
            "tick time µs: p50={} p99={} max={}",
            self.tick_times.value_at_quantile(0.5),
            self.tick_times.value_at_quantile(0.99),
            self.tick_times.max()
        );
    }
}
