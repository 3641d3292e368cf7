// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The incremental scheduler.  A full diagram takes far longer than
//! a frame, so it is computed a slice at a time: each tick processes
//! columns left to right until its budget runs out, and picks up
//! where it left off on the next tick.
//!
//! Columns are computed either inline, or by a single background
//! worker that feeds a bounded queue which each tick drains.  Either
//! way, only the thread running the frame loop ever writes to the
//! display.
//!
//! There is never more than one live `ComputeJob`.  Every restart
//! cancels the previous job (its shared flag is set, its queue is
//! hung up and its worker joined) before the new one is built, and
//! every write checks that the result belongs to the live job, so a
//! superseded job can never paint over a newer one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender, TryRecvError};
use tracing::{debug, info, trace, warn};

use crate::config::{Config, ExecutionMode};
use crate::errors::BifurcateError;
use crate::raster::{normalize, rasterize, ColumnResult};
use crate::sampler::{ConvergenceSampler, DEFAULT_START};
use crate::sink::{DisplaySink, SurfaceHandle};
use crate::viewport::Viewport;

// How long the worker waits on a full queue before checking whether
// it has been cancelled.
const WORKER_POLL: Duration = Duration::from_millis(10);

/// Where a job is in its life.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum JobState {
    /// No job has been started
    Idle,
    /// Columns are being computed
    Running,
    /// The last tick ran out of budget; the next one resumes
    Suspended,
    /// Every column has been presented, in this much time
    Done(Duration),
    /// Superseded; nothing more will be presented
    Cancelled,
}

impl JobState {
    /// True for the two states a job never leaves.
    pub fn is_finished(&self) -> bool {
        match self {
            JobState::Done(_) | JobState::Cancelled => true,
            _ => false,
        }
    }
}

/// Limits on how much one tick may do.  A tick always presents at
/// least one column when one is ready, whatever the budget.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Budget {
    time: Option<Duration>,
    columns: Option<usize>,
}

impl Budget {
    /// Stop once this much wall-clock time has passed.
    pub fn time(time: Duration) -> Self {
        Budget {
            time: Some(time),
            columns: None,
        }
    }

    /// Stop after this many columns.
    pub fn columns(columns: usize) -> Self {
        Budget {
            time: None,
            columns: Some(columns),
        }
    }

    /// No limit at all: run the job to completion (or until the
    /// worker's queue runs dry).
    pub fn unlimited() -> Self {
        Budget {
            time: None,
            columns: None,
        }
    }

    fn exhausted(&self, started: Instant, presented: usize) -> bool {
        self.time.map_or(false, |t| started.elapsed() >= t)
            || self.columns.map_or(false, |c| presented >= c)
    }
}

/// What a tick accomplished.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickReport {
    /// The job the tick worked on; 0 when idle
    pub generation: u64,
    /// Columns written to the display
    pub presented: usize,
    /// The job's state afterward
    pub state: JobState,
}

// The frame loop's end of a worker.  Dropping it hangs up the queue
// and waits for the thread, which notices at its next send; that is
// bounded by one sampling call.
struct Worker {
    results: Option<Receiver<ColumnResult>>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(
        generation: u64,
        viewport: Arc<Viewport>,
        cancelled: Arc<AtomicBool>,
        sampler: ConvergenceSampler,
        queue: usize,
    ) -> Result<Worker, BifurcateError> {
        let (sender, receiver) = channel::bounded(queue);
        let thread = thread::Builder::new()
            .name(format!("column-worker-{}", generation))
            .spawn(move || produce(generation, &viewport, &cancelled, sampler, &sender))
            .map_err(|e| BifurcateError::Worker(e.to_string()))?;
        Ok(Worker {
            results: Some(receiver),
            thread: Some(thread),
        })
    }

    fn try_recv(&self) -> Result<ColumnResult, TryRecvError> {
        match self.results {
            Some(ref results) => results.try_recv(),
            None => Err(TryRecvError::Disconnected),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.results.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("column worker panicked");
            }
        }
    }
}

// The worker's loop: sample every column in order and queue the
// results, checking for cancellation between columns and while the
// queue is full.
fn produce(
    generation: u64,
    viewport: &Viewport,
    cancelled: &AtomicBool,
    sampler: ConvergenceSampler,
    results: &Sender<ColumnResult>,
) {
    let target = viewport.target_count();
    for request in viewport.requests() {
        if cancelled.load(Ordering::Acquire) {
            trace!(generation, column = request.column, "worker cancelled");
            return;
        }
        let mut result = ColumnResult {
            generation,
            column: request.column,
            samples: sampler.sample(request.param, target, DEFAULT_START),
        };
        loop {
            match results.send_timeout(result, WORKER_POLL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(unsent)) => {
                    if cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    result = unsent;
                }
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
    }
}

/// One end-to-end computation of a viewport.
pub struct ComputeJob {
    generation: u64,
    viewport: Arc<Viewport>,
    cursor: usize,
    cancelled: Arc<AtomicBool>,
    started: Instant,
    state: JobState,
    worker: Option<Worker>,
}

impl ComputeJob {
    fn new(generation: u64, viewport: Viewport) -> Self {
        ComputeJob {
            generation,
            viewport: Arc::new(viewport),
            cursor: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
            state: JobState::Running,
            worker: None,
        }
    }

    /// Identifies this job; later jobs have larger generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The snapshot this job is computing.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The next column to be presented.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Where the job is in its life.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Whether the job has been superseded.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if !self.state.is_finished() {
            debug!(
                generation = self.generation,
                cursor = self.cursor,
                "cancelling job"
            );
            self.state = JobState::Cancelled;
        }
        self.worker.take();
    }

    fn finish(&mut self) {
        let elapsed = self.started.elapsed();
        self.state = JobState::Done(elapsed);
        info!(
            generation = self.generation,
            columns = self.viewport.width(),
            elapsed_ms = elapsed.as_millis() as u64,
            "calculating... done"
        );
    }

    // Rasterizes a result and hands it to the display, unless it
    // belongs to some other job or this one has been cancelled.
    fn present<S: DisplaySink + ?Sized>(
        &mut self,
        sink: &mut S,
        surface: SurfaceHandle,
        result: &ColumnResult,
    ) -> bool {
        if result.generation != self.generation || self.is_cancelled() {
            trace!(
                generation = result.generation,
                column = result.column,
                "dropping stale column"
            );
            return false;
        }
        let pixels = normalize(&rasterize(result, &self.viewport), self.generation);
        sink.present_column(surface, &pixels);
        self.cursor = result.column + 1;
        true
    }

    fn compute<S: DisplaySink + ?Sized>(
        &mut self,
        sampler: ConvergenceSampler,
        sink: &mut S,
        surface: SurfaceHandle,
        budget: Budget,
        started: Instant,
    ) -> usize {
        let viewport = Arc::clone(&self.viewport);
        let target = viewport.target_count();
        let mut presented = 0;
        for request in viewport.requests().skip(self.cursor) {
            if presented > 0 && budget.exhausted(started, presented) {
                self.state = JobState::Suspended;
                return presented;
            }
            let result = ColumnResult {
                generation: self.generation,
                column: request.column,
                samples: sampler.sample(request.param, target, DEFAULT_START),
            };
            if !self.present(sink, surface, &result) {
                self.state = JobState::Cancelled;
                return presented;
            }
            presented += 1;
        }
        self.finish();
        presented
    }

    fn drain<S: DisplaySink + ?Sized>(
        &mut self,
        sink: &mut S,
        surface: SurfaceHandle,
        budget: Budget,
        started: Instant,
    ) -> usize {
        let width = self.viewport.width();
        let mut presented = 0;
        loop {
            if self.cursor >= width {
                self.finish();
                return presented;
            }
            if presented > 0 && budget.exhausted(started, presented) {
                self.state = JobState::Suspended;
                return presented;
            }
            let next = match self.worker {
                Some(ref worker) => worker.try_recv(),
                None => return presented,
            };
            match next {
                Ok(result) => {
                    if self.present(sink, surface, &result) {
                        presented += 1;
                    }
                }
                Err(TryRecvError::Empty) => {
                    self.state = JobState::Running;
                    return presented;
                }
                Err(TryRecvError::Disconnected) => {
                    warn!(
                        generation = self.generation,
                        cursor = self.cursor,
                        "column worker hung up early; finishing inline"
                    );
                    self.worker.take();
                    self.state = JobState::Running;
                    return presented;
                }
            }
        }
    }
}

/// Owns the one live job and drives it a tick at a time.
pub struct Scheduler {
    sampler: ConvergenceSampler,
    mode: ExecutionMode,
    compute_budget: Duration,
    frame_budget: Duration,
    generation: u64,
    job: Option<ComputeJob>,
}

impl Scheduler {
    /// Builds an idle scheduler from the session's configuration.
    pub fn new(config: &Config) -> Self {
        Scheduler {
            sampler: ConvergenceSampler::new(config.burn_in, config.tolerance, config.window),
            mode: config.mode,
            compute_budget: config.compute_budget,
            frame_budget: config.frame_budget,
            generation: 0,
            job: None,
        }
    }

    /// The live job, if any.
    pub fn job(&self) -> Option<&ComputeJob> {
        self.job.as_ref()
    }

    /// The live job's state, or `Idle`.
    pub fn state(&self) -> JobState {
        self.job.as_ref().map_or(JobState::Idle, |job| job.state)
    }

    /// Columns presented so far, out of the total.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.job
            .as_ref()
            .map(|job| (job.cursor, job.viewport.width()))
    }

    /// Cancels whatever is running and starts computing `viewport`
    /// from its first column.  Returns the new job's generation.
    pub fn restart(&mut self, viewport: Viewport) -> Result<u64, BifurcateError> {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let (param_start, param_end) = viewport.param_range();
        info!(
            generation,
            width = viewport.width(),
            height = viewport.height(),
            param_start,
            param_end,
            subsample = viewport.subsample(),
            "drawing"
        );

        let mut job = ComputeJob::new(generation, viewport);
        if let ExecutionMode::Worker { queue } = self.mode {
            job.worker = Some(Worker::spawn(
                generation,
                Arc::clone(&job.viewport),
                Arc::clone(&job.cancelled),
                self.sampler,
                queue,
            )?);
        }
        self.job = Some(job);
        Ok(generation)
    }

    /// Cancels the live job.  It stays around, in the `Cancelled`
    /// state, until the next restart replaces it.
    pub fn cancel(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.cancel();
        }
    }

    /// Advances the live job under the configured budget: the compute
    /// budget inline, the frame budget when draining a worker.
    pub fn tick<S: DisplaySink + ?Sized>(
        &mut self,
        sink: &mut S,
        surface: SurfaceHandle,
    ) -> TickReport {
        let budget = match self.job {
            Some(ref job) if job.worker.is_some() => Budget::time(self.frame_budget),
            _ => Budget::time(self.compute_budget),
        };
        self.tick_with(sink, surface, budget)
    }

    /// Advances the live job under an explicit budget.
    pub fn tick_with<S: DisplaySink + ?Sized>(
        &mut self,
        sink: &mut S,
        surface: SurfaceHandle,
        budget: Budget,
    ) -> TickReport {
        let sampler = self.sampler;
        let job = match self.job.as_mut() {
            Some(job) => job,
            None => {
                return TickReport {
                    generation: 0,
                    presented: 0,
                    state: JobState::Idle,
                }
            }
        };

        if !job.state.is_finished() && job.is_cancelled() {
            job.state = JobState::Cancelled;
        }
        if job.state.is_finished() {
            return TickReport {
                generation: job.generation,
                presented: 0,
                state: job.state,
            };
        }

        let started = Instant::now();
        let presented = if job.worker.is_some() {
            job.drain(sink, surface, budget, started)
        } else {
            job.compute(sampler, sink, surface, budget, started)
        };

        if job.state.is_finished() {
            sink.present_progress(surface, None);
        } else {
            sink.present_progress(surface, Some(job.cursor));
            debug!(
                generation = job.generation,
                percent = (job.cursor * 100 / job.viewport.width()) as u64,
                "calculating..."
            );
        }

        TickReport {
            generation: job.generation,
            presented,
            state: job.state,
        }
    }
}
