//! Drives the zoom movie: a sequence of independent single-frame
//! renders, each launched as its own child process, with a cap on how
//! many run at once.  The driver launches frames in order and blocks
//! on "any one finishes" whenever the cap is reached; completion order
//! is whatever it is, since every frame writes its own file.
//!
//! The launch itself sits behind a small trait so the tests can swap
//! the child processes for in-process doubles and watch the
//! concurrency bound do its job.

extern crate crossbeam;

use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};

use crossbeam::channel::Receiver;
use num::Complex;

use error::Error;

/// Parameters for a zoom sequence.  The scale of frame k interpolates
/// geometrically from `zoom_start` toward `zoom_end`, which is what a
/// linear-feeling zoom looks like on playback.
#[derive(Clone, Debug)]
pub struct FrameSequenceSpec {
    /// Number of frames to render.
    pub frames: usize,
    /// Scale the schedule starts from.
    pub zoom_start: f64,
    /// Scale the schedule closes in on; `zoom_for_frame(frames)`
    /// lands here.
    pub zoom_end: f64,
    /// Fixed center point of every frame.
    pub center: Complex<f64>,
    /// Iteration budget handed to each frame.
    pub limit: u32,
    /// Raster width handed to each frame.
    pub width: usize,
    /// Raster height handed to each frame.
    pub height: usize,
    /// Worker threads inside each frame process.
    pub threads: usize,
    /// Cap on concurrently running frame processes.
    pub max_concurrent: usize,
    /// The single-frame renderer to execute.
    pub program: PathBuf,
    /// Directory that receives the numbered bitmaps.
    pub outdir: PathBuf,
}

impl FrameSequenceSpec {
    /// Refuse sequences that cannot run: no frames, no process slots,
    /// or zoom endpoints outside the domain of the schedule.
    pub fn validate(&self) -> Result<(), Error> {
        if self.frames == 0 || self.max_concurrent == 0 {
            return Err(Error::EmptySequence);
        }
        if self.zoom_start <= 0.0 || self.zoom_end <= 0.0 {
            return Err(Error::BadZoom {
                start: self.zoom_start,
                end: self.zoom_end,
            });
        }
        Ok(())
    }

    /// The scale for 1-indexed frame k:
    /// `zoom_start * exp(ln(zoom_end/zoom_start) * k / frames)`.
    /// Each frame's scale is the previous one times a constant ratio,
    /// and the last frame reaches `zoom_end`.
    pub fn zoom_for_frame(&self, frame: usize) -> f64 {
        let ratio = (self.zoom_end / self.zoom_start).ln();
        self.zoom_start * (ratio * (frame as f64) / (self.frames as f64)).exp()
    }

    /// The fully templated launch for 1-indexed frame k: the complete
    /// single-frame argument list and the frame's own output file,
    /// `mandel<k>.bmp` under `outdir`.
    pub fn invocation(&self, frame: usize) -> FrameInvocation {
        let zoom = self.zoom_for_frame(frame);
        let output = self.outdir.join(format!("mandel{}.bmp", frame));
        let args = vec![
            "-x".to_string(),
            self.center.re.to_string(),
            "-y".to_string(),
            self.center.im.to_string(),
            "-m".to_string(),
            self.limit.to_string(),
            "-s".to_string(),
            zoom.to_string(),
            "-W".to_string(),
            self.width.to_string(),
            "-H".to_string(),
            self.height.to_string(),
            "-n".to_string(),
            self.threads.to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];
        FrameInvocation {
            frame,
            zoom,
            program: self.program.clone(),
            args,
            output,
        }
    }
}

/// One fully parameterized frame launch.
#[derive(Clone, Debug)]
pub struct FrameInvocation {
    /// 1-indexed frame number.
    pub frame: usize,
    /// Scale handed to the renderer.
    pub zoom: f64,
    /// Program to execute.
    pub program: PathBuf,
    /// Complete argument list for the program.
    pub args: Vec<String>,
    /// The bitmap this frame writes.
    pub output: PathBuf,
}

impl FrameInvocation {
    /// Build the ready-to-spawn command.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// How a frame process ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameExit {
    /// Whether the process reported success.
    pub success: bool,
    /// The exit code, when there is one; a frame killed by a signal
    /// has none.
    pub code: Option<i32>,
}

impl From<ExitStatus> for FrameExit {
    fn from(status: ExitStatus) -> FrameExit {
        FrameExit {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// The completion record for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameResult {
    /// 1-indexed frame number.
    pub frame: usize,
    /// How the frame ended.
    pub exit: FrameExit,
}

/// A launched frame that can be waited on.
pub trait FrameTask: Send {
    /// Block until the frame finishes and report how it ended.
    fn wait(&mut self) -> io::Result<FrameExit>;
}

/// Launches frames.  The production implementation spawns child
/// processes; tests substitute counting doubles.
pub trait FrameSpawner {
    /// The in-flight handle this spawner produces.
    type Task: FrameTask;

    /// Start the frame described by `invocation`.
    fn spawn(&mut self, invocation: &FrameInvocation) -> io::Result<Self::Task>;
}

/// Spawns every frame as a child process of the configured program.
pub struct ProcessSpawner;

/// A running frame child process.
pub struct ChildTask(Child);

impl FrameTask for ChildTask {
    fn wait(&mut self) -> io::Result<FrameExit> {
        self.0.wait().map(FrameExit::from)
    }
}

impl FrameSpawner for ProcessSpawner {
    type Task = ChildTask;

    fn spawn(&mut self, invocation: &FrameInvocation) -> io::Result<ChildTask> {
        invocation.command().spawn().map(ChildTask)
    }
}

/// Run the whole sequence.  Frames launch serially on the calling
/// thread, so launch order is strictly frame order; each launched task
/// is handed to a monitor thread that waits on it and reports over a
/// channel, and the channel receive is the "any one finishes" block
/// that enforces the cap.  Returns one result per frame, in completion
/// order.  A launch or wait failure aborts the run: nothing new is
/// launched, the error propagates, and frames already running are left
/// to finish.
pub fn drive<S>(spec: &FrameSequenceSpec, spawner: &mut S) -> Result<Vec<FrameResult>, Error>
where
    S: FrameSpawner,
    S::Task: 'static,
{
    spec.validate()?;
    let (done_tx, done_rx) = crossbeam::channel::unbounded();
    crossbeam::scope(|scope| -> Result<Vec<FrameResult>, Error> {
        let mut results = Vec::with_capacity(spec.frames);
        let mut in_flight = 0;
        for frame in 1..=spec.frames {
            if in_flight == spec.max_concurrent {
                results.push(collect_one(&done_rx)?);
                in_flight -= 1;
            }
            let invocation = spec.invocation(frame);
            let mut task = spawner
                .spawn(&invocation)
                .map_err(|cause| Error::FrameLaunch { frame, cause })?;
            let done = done_tx.clone();
            scope.spawn(move |_| {
                let exit = task.wait();
                done.send((frame, exit)).unwrap();
            });
            in_flight += 1;
        }
        while in_flight > 0 {
            results.push(collect_one(&done_rx)?);
            in_flight -= 1;
        }
        Ok(results)
    })
    .unwrap()
}

fn collect_one(done: &Receiver<(usize, io::Result<FrameExit>)>) -> Result<FrameResult, Error> {
    let (frame, exit) = done
        .recv()
        .expect("a monitor thread is live for every in-flight frame");
    match exit {
        Ok(exit) => Ok(FrameResult { frame, exit }),
        Err(cause) => Err(Error::FrameWait { frame, cause }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn spec(frames: usize, max_concurrent: usize) -> FrameSequenceSpec {
        FrameSequenceSpec {
            frames,
            zoom_start: 2.0,
            zoom_end: 0.00000000001,
            center: Complex::new(0.2929859127507, 0.6117848324958),
            limit: 10000,
            width: 1024,
            height: 1024,
            threads: 1,
            max_concurrent,
            program: PathBuf::from("mandel"),
            outdir: PathBuf::from("."),
        }
    }

    #[derive(Default)]
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    struct StubTask {
        gauge: Arc<Gauge>,
        exit: FrameExit,
    }

    impl FrameTask for StubTask {
        fn wait(&mut self) -> io::Result<FrameExit> {
            thread::sleep(Duration::from_millis(2));
            self.gauge.running.fetch_sub(1, Ordering::SeqCst);
            Ok(self.exit)
        }
    }

    struct StubSpawner {
        gauge: Arc<Gauge>,
        launched: Vec<usize>,
        failing_frame: Option<usize>,
        unlaunchable_frame: Option<usize>,
    }

    impl StubSpawner {
        fn new() -> StubSpawner {
            StubSpawner {
                gauge: Arc::new(Gauge::default()),
                launched: vec![],
                failing_frame: None,
                unlaunchable_frame: None,
            }
        }

        fn peak(&self) -> usize {
            self.gauge.peak.load(Ordering::SeqCst)
        }
    }

    impl FrameSpawner for StubSpawner {
        type Task = StubTask;

        fn spawn(&mut self, invocation: &FrameInvocation) -> io::Result<StubTask> {
            if self.unlaunchable_frame == Some(invocation.frame) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
            }
            self.launched.push(invocation.frame);
            let now = self.gauge.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.gauge.peak.fetch_max(now, Ordering::SeqCst);
            let exit = if self.failing_frame == Some(invocation.frame) {
                FrameExit {
                    success: false,
                    code: Some(1),
                }
            } else {
                FrameExit {
                    success: true,
                    code: Some(0),
                }
            };
            Ok(StubTask {
                gauge: self.gauge.clone(),
                exit,
            })
        }
    }

    #[test]
    fn a_serial_cap_runs_every_frame_one_at_a_time() {
        let mut spawner = StubSpawner::new();
        let results = drive(&spec(50, 1), &mut spawner).unwrap();
        assert_eq!(results.len(), 50);
        assert_eq!(spawner.launched, (1..=50).collect::<Vec<_>>());
        assert_eq!(spawner.peak(), 1);
        // At cap one, completion order is launch order too.
        let seen: Vec<usize> = results.iter().map(|r| r.frame).collect();
        assert_eq!(seen, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn a_wider_cap_stays_bounded() {
        let mut spawner = StubSpawner::new();
        let results = drive(&spec(20, 4), &mut spawner).unwrap();
        assert_eq!(results.len(), 20);
        assert!(spawner.peak() <= 4);
        assert_eq!(spawner.launched, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn a_failing_frame_is_reported_not_swallowed() {
        let mut spawner = StubSpawner::new();
        spawner.failing_frame = Some(7);
        let results = drive(&spec(10, 2), &mut spawner).unwrap();
        let failed: Vec<&FrameResult> = results.iter().filter(|r| !r.exit.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].frame, 7);
        assert_eq!(failed[0].exit.code, Some(1));
    }

    #[test]
    fn a_launch_failure_aborts_the_run() {
        let mut spawner = StubSpawner::new();
        spawner.unlaunchable_frame = Some(3);
        match drive(&spec(10, 2), &mut spawner) {
            Err(Error::FrameLaunch { frame, .. }) => assert_eq!(frame, 3),
            other => panic!("expected a launch failure, got {:?}", other),
        }
        // Frames one and two went out; nothing after the failure did.
        assert_eq!(spawner.launched, vec![1, 2]);
    }

    #[test]
    fn an_empty_sequence_is_refused() {
        let mut spawner = StubSpawner::new();
        assert!(drive(&spec(0, 1), &mut spawner).is_err());
        assert!(drive(&spec(10, 0), &mut spawner).is_err());
        let mut bad = spec(10, 1);
        bad.zoom_end = 0.0;
        assert!(drive(&bad, &mut spawner).is_err());
    }

    #[test]
    fn the_zoom_schedule_is_geometric() {
        let spec = spec(50, 1);
        let ratio = (spec.zoom_end / spec.zoom_start).ln() / 50.0;
        let step = ratio.exp();
        assert!((spec.zoom_for_frame(1) - spec.zoom_start * step).abs() < 1e-12);
        let last = spec.zoom_for_frame(50);
        assert!((last - spec.zoom_end).abs() / spec.zoom_end < 1e-9);
        for frame in 1..50 {
            assert!(spec.zoom_for_frame(frame + 1) < spec.zoom_for_frame(frame));
        }
    }

    #[test]
    fn an_invocation_carries_the_full_argument_list() {
        let spec = spec(50, 1);
        let invocation = spec.invocation(7);
        assert_eq!(invocation.frame, 7);
        assert_eq!(invocation.zoom, spec.zoom_for_frame(7));
        assert_eq!(invocation.output, PathBuf::from("./mandel7.bmp"));
        let args = invocation.args.join(" ");
        assert!(args.contains("-x 0.2929859127507"));
        assert!(args.contains("-y 0.6117848324958"));
        assert!(args.contains("-m 10000"));
        assert!(args.contains("-W 1024"));
        assert!(args.contains("-H 1024"));
        assert!(args.contains("-n 1"));
        assert!(args.contains("-o ./mandel7.bmp"));
        let position = invocation.args.iter().position(|a| a == "-s").unwrap();
        let zoom: f64 = invocation.args[position + 1].parse().unwrap();
        assert_eq!(zoom, invocation.zoom);
    }
}
