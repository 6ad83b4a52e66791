use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::framer::{FrameSink, FramerOutcome, RecordFramer};
use crate::schema::FrameLayout;
use crate::source::{FileRead, FileSource, SocketRead, SocketSource, READ_BUFFER_BYTES};

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/frameguard.frames";
pub const DEFAULT_CSV_PATH: &str = "frames.csv";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive zero-byte reads, with a back-off between them, after which
/// the socket counts as exhausted.
const SOCKET_EXHAUSTED_EMPTY_READS: u32 = 2;

/// Cross-thread shutdown flag with a cancellable wait.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        if let Ok(mut stopped) = self.stopped.lock() {
            *stopped = true;
        }
        self.condvar.notify_all();
    }

    /// A poisoned signal reads as triggered so workers stand down.
    pub fn is_triggered(&self) -> bool {
        self.stopped.lock().map(|stopped| *stopped).unwrap_or(true)
    }

    /// Blocks for up to `timeout`, waking early on [`StopSignal::trigger`].
    /// Returns whether the signal is triggered.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let Ok(stopped) = self.stopped.lock() else {
            return true;
        };
        self.condvar
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .map(|(stopped, _)| *stopped)
            .unwrap_or(true)
    }
}

/// Static inputs of one pipeline run. The layout is resolved before the
/// worker starts and stays fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub socket_path: PathBuf,
    pub csv_path: PathBuf,
    pub layout: FrameLayout,
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            layout: FrameLayout::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PipelineCounters {
    frames_dispatched: AtomicU64,
    records_rejected: AtomicU64,
    bytes_read: AtomicU64,
    source_switches: AtomicU64,
}

impl PipelineCounters {
    fn apply(&self, outcome: FramerOutcome) {
        if outcome.dispatched > 0 {
            self.frames_dispatched
                .fetch_add(outcome.dispatched, Ordering::Relaxed);
        }
        if outcome.rejected > 0 {
            self.records_rejected
                .fetch_add(outcome.rejected, Ordering::Relaxed);
        }
    }

    fn tally_record(&self, dispatched: bool) {
        if dispatched {
            self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
        } else {
            self.records_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn add_bytes(&self, count: u64) {
        self.bytes_read.fetch_add(count, Ordering::Relaxed);
    }

    fn mark_switch(&self) {
        self.source_switches.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_dispatched: self.frames_dispatched.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            source_switches: self.source_switches.load(Ordering::Relaxed),
        }
    }
}

/// Counter snapshot, safe to read from any thread while the worker runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_dispatched: u64,
    pub records_rejected: u64,
    pub bytes_read: u64,
    pub source_switches: u64,
}

enum PipelinePhase {
    Disconnected,
    Streaming(SocketSource),
    DrainingToFallback,
    Stopped,
}

/// Owns the ingestion thread: a blocking loop that streams records from the
/// frame socket and falls back to tailing the record file once the socket
/// is unavailable or exhausted.
///
/// Stop latency is bounded by the poll interval at every waiting point. A
/// socket read that blocks without yielding data or an error holds the
/// join until it returns; reads carry no timeout.
pub struct IngestWorker {
    stop: Arc<StopSignal>,
    counters: Arc<PipelineCounters>,
    handle: Option<JoinHandle<()>>,
}

impl IngestWorker {
    /// Spawns the pipeline thread; the sink runs on that thread. Fails only
    /// when the OS refuses a new thread.
    pub fn spawn<S>(config: PipelineConfig, sink: S) -> io::Result<Self>
    where
        S: FrameSink + Send + 'static,
    {
        let stop = Arc::new(StopSignal::new());
        let counters = Arc::new(PipelineCounters::default());
        let thread_stop = Arc::clone(&stop);
        let thread_counters = Arc::clone(&counters);
        let handle = std::thread::Builder::new()
            .name("frame-ingest".into())
            .spawn(move || run_pipeline(config, sink, thread_stop, thread_counters))?;

        Ok(Self {
            stop,
            counters,
            handle: Some(handle),
        })
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    /// Signals shutdown and joins the pipeline thread, then returns the
    /// final counters. No frame is dispatched after this returns.
    pub fn stop(mut self) -> PipelineStats {
        self.shutdown();
        self.counters.snapshot()
    }

    fn shutdown(&mut self) {
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("frame pipeline thread panicked");
            }
        }
    }
}

impl Drop for IngestWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_pipeline<S>(
    config: PipelineConfig,
    mut sink: S,
    stop: Arc<StopSignal>,
    counters: Arc<PipelineCounters>,
) where
    S: FrameSink,
{
    let mut framer = RecordFramer::new(config.layout);
    let mut phase = PipelinePhase::Disconnected;

    loop {
        phase = match phase {
            PipelinePhase::Disconnected => connect_phase(&config, &counters),
            PipelinePhase::Streaming(source) => {
                stream_phase(source, &mut framer, &mut sink, &config, &stop, &counters)
            }
            PipelinePhase::DrainingToFallback => {
                fallback_phase(&mut framer, &mut sink, &config, &stop, &counters)
            }
            PipelinePhase::Stopped => break,
        };
    }

    let stats = counters.snapshot();
    info!(
        frames = stats.frames_dispatched,
        rejected = stats.records_rejected,
        bytes = stats.bytes_read,
        "frame pipeline stopped"
    );
}

fn connect_phase(config: &PipelineConfig, counters: &PipelineCounters) -> PipelinePhase {
    match SocketSource::connect(&config.socket_path) {
        Ok(source) => {
            info!(path = %config.socket_path.display(), "streaming frames from socket");
            PipelinePhase::Streaming(source)
        }
        Err(err) => {
            warn!(
                path = %config.socket_path.display(),
                error = %err,
                "frame socket unavailable, switching to file fallback"
            );
            counters.mark_switch();
            PipelinePhase::DrainingToFallback
        }
    }
}

fn stream_phase(
    mut source: SocketSource,
    framer: &mut RecordFramer,
    sink: &mut dyn FrameSink,
    config: &PipelineConfig,
    stop: &StopSignal,
    counters: &PipelineCounters,
) -> PipelinePhase {
    let mut buf = [0u8; READ_BUFFER_BYTES];
    let mut empty_reads = 0u32;

    while !stop.is_triggered() {
        match source.read_chunk(&mut buf) {
            SocketRead::Data(count) => {
                empty_reads = 0;
                counters.add_bytes(count as u64);
                counters.apply(framer.push_bytes(&buf[..count], sink));
            }
            SocketRead::Empty => {
                empty_reads += 1;
                if empty_reads >= SOCKET_EXHAUSTED_EMPTY_READS {
                    // A record cut off by the peer closing still counts.
                    counters.apply(framer.drain(sink));
                    info!("frame socket exhausted, switching to file fallback");
                    counters.mark_switch();
                    return PipelinePhase::DrainingToFallback;
                }
                if stop.wait_for(config.poll_interval) {
                    break;
                }
            }
            SocketRead::Retry => {
                if stop.wait_for(config.poll_interval) {
                    break;
                }
            }
        }
    }

    PipelinePhase::Stopped
}

fn fallback_phase(
    framer: &mut RecordFramer,
    sink: &mut dyn FrameSink,
    config: &PipelineConfig,
    stop: &StopSignal,
    counters: &PipelineCounters,
) -> PipelinePhase {
    let mut source = match FileSource::open(&config.csv_path) {
        Ok(source) => {
            info!(path = %config.csv_path.display(), "tailing fallback frame file");
            source
        }
        Err(err) => {
            warn!(
                path = %config.csv_path.display(),
                error = %err,
                "fallback frame file unavailable, no frame source left"
            );
            return PipelinePhase::Stopped;
        }
    };

    while !stop.is_triggered() {
        match source.read_record() {
            FileRead::Record(record) => {
                counters.add_bytes(record.len() as u64 + 1);
                counters.tally_record(framer.push_record(&record, sink));
            }
            FileRead::Pending => {
                if stop.wait_for(config.poll_interval) {
                    break;
                }
            }
        }
    }

    PipelinePhase::Stopped
}
