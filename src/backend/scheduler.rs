use crate::backend::sampler::{MetricSampler, SamplerSettings};
use crate::model::SampleResult;
use flume::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// Receives every completed sample, on the scheduler thread.
pub trait SampleSink: Send + 'static {
    fn deliver(&mut self, sample: SampleResult);
}

impl<F> SampleSink for F
where
    F: FnMut(SampleResult) + Send + 'static,
{
    fn deliver(&mut self, sample: SampleResult) {
        self(sample)
    }
}

/// Forwards samples over a channel. A full or closed channel drops the sample.
pub struct ChannelSink(pub flume::Sender<SampleResult>);

impl SampleSink for ChannelSink {
    fn deliver(&mut self, sample: SampleResult) {
        if let Err(e) = self.0.try_send(sample) {
            log::debug!("Sample dropped: {}", e);
        }
    }
}

enum Control {
    Pause(Option<flume::Sender<()>>),
    Resume,
    Stop,
}

/// Cloneable pause/resume handle for a running [`Scheduler`]. Holding one
/// does not keep the worker alive.
#[derive(Clone)]
pub struct SchedulerControl {
    control: flume::Sender<Control>,
    worker: ThreadId,
}

impl SchedulerControl {
    /// Stops delivering ticks until [`resume`](Self::resume). When called
    /// from another thread it returns once the worker is idle, so no sample
    /// arrives afterwards.
    pub fn pause(&self) {
        if self.on_worker() {
            let _ = self.control.send(Control::Pause(None));
            return;
        }
        let (ack, done) = flume::bounded(1);
        if self.control.send(Control::Pause(Some(ack))).is_ok() {
            // Disconnects instead if the loop stops first.
            let _ = done.recv();
        }
    }

    pub fn resume(&self) {
        let _ = self.control.send(Control::Resume);
    }

    fn on_worker(&self) -> bool {
        thread::current().id() == self.worker
    }
}

/// Runs a [`MetricSampler`] on its own thread at a fixed period.
///
/// Ticks never overlap: a slow tick pushes the next one back. Pausing keeps
/// all sampler state; stopping joins the thread and returns the sampler.
pub struct Scheduler {
    remote: SchedulerControl,
    handle: Option<JoinHandle<MetricSampler>>,
}

impl Scheduler {
    pub fn start(
        sampler: MetricSampler,
        settings: Arc<Mutex<SamplerSettings>>,
        period: Duration,
        sink: impl SampleSink,
    ) -> std::io::Result<Self> {
        let (control, rx) = flume::unbounded();
        let period = period.max(Duration::from_millis(1));
        let handle = thread::Builder::new()
            .name("sampler".into())
            .spawn(move || run(sampler, settings, period, sink, rx))?;
        let worker = handle.thread().id();
        log::info!("Scheduler started with period {:?}", period);
        Ok(Self {
            remote: SchedulerControl { control, worker },
            handle: Some(handle),
        })
    }

    pub fn control(&self) -> SchedulerControl {
        self.remote.clone()
    }

    pub fn pause(&self) {
        self.remote.pause();
    }

    pub fn resume(&self) {
        self.remote.resume();
    }

    /// Lets an in-flight tick finish, then ends the loop. Returns the
    /// sampler with its history, or None when called from the sink itself.
    pub fn stop(mut self) -> Option<MetricSampler> {
        self.shutdown()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn shutdown(&mut self) -> Option<MetricSampler> {
        let _ = self.remote.control.send(Control::Stop);
        let handle = self.handle.take()?;
        if self.remote.on_worker() {
            // Joining ourselves would deadlock; the loop exits after this tick.
            return None;
        }
        match handle.join() {
            Ok(sampler) => {
                log::info!("Scheduler stopped after {} ticks", sampler.ticks());
                Some(sampler)
            }
            Err(_) => {
                log::error!("Sampler thread panicked");
                None
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    mut sampler: MetricSampler,
    settings: Arc<Mutex<SamplerSettings>>,
    period: Duration,
    mut sink: impl SampleSink,
    control: flume::Receiver<Control>,
) -> MetricSampler {
    let mut paused = false;
    let mut next = Instant::now() + period;

    loop {
        let message = if paused {
            control.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            control.recv_deadline(next)
        };

        match message {
            Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(Control::Pause(ack)) => {
                if !paused {
                    log::info!("Sampling paused");
                }
                paused = true;
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            Ok(Control::Resume) => {
                if paused {
                    log::info!("Sampling resumed");
                    paused = false;
                    next = Instant::now() + period;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let snapshot = match settings.lock() {
                    Ok(guard) => guard.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                };
                let sample = sampler.tick(&snapshot, Instant::now());
                sink.deliver(sample);

                // Missed deadlines are skipped, not replayed.
                next += period;
                let now = Instant::now();
                if next < now {
                    next = now + period;
                }
            }
        }
    }

    sampler
}
