//! Job runner and orchestrator — drives the full audio → model → text
//! sequence for one job.
//!
//! # Flow
//!
//! ```text
//! JobRunner::submit(job)
//!   ├─ busy flag already set → Err(SubmitError::Busy), nothing starts
//!   └─ spawn_blocking(run_job)
//!         ├─ prepare_audio        [Status + Progress 10]
//!         ├─ ModelProvider        [Status + Progress 30]
//!         ├─ load_wav_mono_16k    [Status + Progress 50]
//!         ├─ SttEngine::transcribe
//!         │     └─ per segment: Segment + Progress 50→90
//!         └─ Completed(Transcript)  /  Failed(message) from any stage
//! ```
//!
//! All blocking work (the ffmpeg subprocess, WAV decoding, Whisper
//! inference) runs on the tokio blocking pool so the UI thread is never
//! touched.  The worker communicates exclusively through the
//! [`EventSender`]; it never sees UI state.
//!
//! Every stage failure is converted into a single `Failed` event — the
//! worker never dies silently — and the temporary WAV (when one was made)
//! is removed on every exit path because [`PreparedAudio`] deletes it on
//! drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::audio::{load_wav_mono_16k, prepare_audio, AudioExtractor};
use crate::stt::{language_hint, ModelProvider};
use crate::transcript::{format_duration, Transcript};

use super::events::{EventSender, JobEvent};
use super::job::Job;

// ---------------------------------------------------------------------------
// Progress layout
// ---------------------------------------------------------------------------

/// Progress shown while the audio-preparation stage runs.
const PROGRESS_PREPARING: u8 = 10;
/// Progress shown while the model loads.
const PROGRESS_LOADING: u8 = 30;
/// Progress when inference starts; segments advance from here.
const PROGRESS_TRANSCRIBING: u8 = 50;
/// Width of the per-segment progress band (50 → 90).
const SEGMENT_SPAN: u8 = 40;

// ---------------------------------------------------------------------------
// SubmitError
// ---------------------------------------------------------------------------

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A job is already running; at most one runs at a time.
    #[error("A transcription is already in progress")]
    Busy,
}

// ---------------------------------------------------------------------------
// JobRunner
// ---------------------------------------------------------------------------

/// Owns the background execution of jobs and the at-most-one-job invariant.
///
/// The invariant is enforced structurally: `submit` claims the `busy` flag
/// with a compare-exchange before anything is spawned, and a guard releases
/// it when the worker finishes (normally or by panic).  The flag lives on
/// this instance, not in process-wide state.
pub struct JobRunner {
    handle: tokio::runtime::Handle,
    extractor: Arc<dyn AudioExtractor>,
    models: Arc<dyn ModelProvider>,
    events: EventSender,
    busy: Arc<AtomicBool>,
}

impl JobRunner {
    /// Create a runner that spawns workers onto `handle` and reports through
    /// `events`.
    pub fn new(
        handle: tokio::runtime::Handle,
        extractor: Arc<dyn AudioExtractor>,
        models: Arc<dyn ModelProvider>,
        events: EventSender,
    ) -> Self {
        Self {
            handle,
            extractor,
            models,
            events,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `true` while a worker is active.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `job` on the background pool.
    ///
    /// Fire-and-forget: all further communication happens through the event
    /// channel.  Returns [`SubmitError::Busy`] — and starts nothing — when a
    /// job is already running.
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("runner: rejected {:?}, a job is already running", job.source);
            return Err(SubmitError::Busy);
        }

        log::info!(
            "runner: starting job for {} (model {}, language {})",
            job.source.display(),
            job.model,
            job.language
        );

        let extractor = Arc::clone(&self.extractor);
        let models = Arc::clone(&self.models);
        let events = self.events.clone();
        let guard = BusyGuard(Arc::clone(&self.busy));

        self.handle.spawn_blocking(move || {
            let _guard = guard;
            run_job(&job, extractor.as_ref(), models.as_ref(), &events);
        });

        Ok(())
    }
}

/// Releases the busy flag when the worker ends, panic included.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// run_job — the orchestrator
// ---------------------------------------------------------------------------

/// Execute one job from start to finish, emitting events at every stage.
///
/// Never panics on stage failure: each stage's error becomes one `Failed`
/// event and the remaining stages are skipped.  The temporary audio file, if
/// any, is removed when `prepared` goes out of scope on every path.
pub fn run_job(
    job: &Job,
    extractor: &dyn AudioExtractor,
    models: &dyn ModelProvider,
    events: &EventSender,
) {
    // ── 1. Audio preparation ─────────────────────────────────────────────
    events.push(JobEvent::Status("Preparing audio…".into()));
    events.push(JobEvent::Progress(PROGRESS_PREPARING));

    let prepared = match prepare_audio(&job.source, extractor) {
        Ok(prepared) => prepared,
        Err(e) => {
            fail(events, e.to_string());
            return;
        }
    };

    // ── 2. Model load (cached after the first job per model) ─────────────
    events.push(JobEvent::Status(format!("Loading model \"{}\"…", job.model)));
    events.push(JobEvent::Progress(PROGRESS_LOADING));

    let engine = match models.engine_for(job.model) {
        Ok(engine) => engine,
        Err(e) => {
            fail(events, e.to_string());
            return;
        }
    };

    // ── 3. Decode the prepared WAV ───────────────────────────────────────
    let samples = match load_wav_mono_16k(prepared.path()) {
        Ok(samples) => samples,
        Err(e) => {
            fail(events, e.to_string());
            return;
        }
    };
    let source_secs = samples.len() as u64 / crate::audio::TARGET_SAMPLE_RATE as u64;

    // ── 4. Inference ─────────────────────────────────────────────────────
    events.push(JobEvent::Status("Transcribing…".into()));
    events.push(JobEvent::Progress(PROGRESS_TRANSCRIBING));

    let result = match engine.transcribe(&samples, language_hint(&job.language)) {
        Ok(result) => result,
        Err(e) => {
            fail(events, e.to_string());
            return;
        }
    };

    log::info!(
        "runner: transcribed {} segment(s) in {} ms",
        result.segments.len(),
        result.duration_ms
    );

    // Re-emit segments with progress mapped into the 50–90 band so earlier
    // stages keep their visible share.
    let total = result.segments.len().max(1) as u64;
    for (i, segment) in result.segments.iter().enumerate() {
        events.push(JobEvent::Segment(segment.text.clone()));
        let step = (i as u64 + 1) * SEGMENT_SPAN as u64 / total;
        events.push(JobEvent::Progress(PROGRESS_TRANSCRIBING + step as u8));
    }

    // ── 5. Completion ────────────────────────────────────────────────────
    events.push(JobEvent::Progress(100));
    events.push(JobEvent::Status("Extraction complete".into()));
    events.push(JobEvent::Completed(Transcript {
        text: result.text,
        language: result.language,
        source_duration: format_duration(source_secs),
        model: job.model,
    }));
}

/// Emit the single `Failed` event for this job.
fn fail(events: &EventSender, message: String) {
    log::error!("runner: job failed: {message}");
    events.push(JobEvent::Status("Extraction failed".into()));
    events.push(JobEvent::Failed(message));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use tempfile::tempdir;

    use crate::audio::MockExtractor;
    use crate::pipeline::events::{event_channel, EventReceiver};
    use crate::stt::{
        MockModelProvider, MockSttEngine, ModelKind, SttEngine, SttError, TranscriptionResult,
    };

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn provider_with(engine: MockSttEngine) -> Arc<MockModelProvider> {
        Arc::new(MockModelProvider::with_engine(Arc::new(engine)))
    }

    fn progress_values(events: &[JobEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                JobEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn failed_messages(events: &[JobEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                JobEvent::Failed(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Write a silent pass-through WAV and return its path.
    fn silent_wav(dir: &Path, secs: u32) -> std::path::PathBuf {
        let path = dir.join("input.wav");
        let samples = vec![0_i16; (16_000 * secs) as usize];
        crate::audio::wav::write_wav_i16(&path, &samples, 16_000, 1).unwrap();
        path
    }

    // -----------------------------------------------------------------------
    // run_job — success paths
    // -----------------------------------------------------------------------

    #[test]
    fn completed_flow_emits_ordered_events() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let provider = provider_with(MockSttEngine::with_segments(&[" Hello", " world."]));

        run_job(
            &Job::new(&wav, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();

        // First event is a status, last is Completed.
        assert!(matches!(events.first(), Some(JobEvent::Status(_))));
        let JobEvent::Completed(transcript) = events.last().unwrap() else {
            panic!("expected Completed, got {:?}", events.last());
        };
        assert_eq!(transcript.text, "Hello world.");
        assert_eq!(transcript.model, ModelKind::Base);
        assert_eq!(transcript.source_duration, "0:01");

        // Both segments arrive, in order.
        let segments: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                JobEvent::Segment(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(segments, vec![" Hello", " world."]);

        // Progress is monotonically non-decreasing, ends at 100, stays in
        // range.
        let progress = progress_values(&events);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert_eq!(*progress.last().unwrap(), 100);
        assert!(progress.iter().all(|&p| p <= 100));

        // No failure anywhere.
        assert!(failed_messages(&events).is_empty());
    }

    #[test]
    fn segment_progress_stays_inside_its_band() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let segs: Vec<String> = (0..7).map(|i| format!(" s{i}")).collect();
        let seg_refs: Vec<&str> = segs.iter().map(String::as_str).collect();
        let provider = provider_with(MockSttEngine::with_segments(&seg_refs));

        run_job(
            &Job::new(&wav, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();
        let progress = progress_values(&events);
        // Everything after the inference start and before the final 100 must
        // stay within 50..=90.
        let band: Vec<u8> = progress
            .iter()
            .copied()
            .filter(|&p| p > PROGRESS_TRANSCRIBING && p < 100)
            .collect();
        assert!(!band.is_empty());
        assert!(band.iter().all(|&p| p <= 90), "{band:?}");
        assert_eq!(*band.last().unwrap(), 90);
    }

    #[test]
    fn silent_wav_end_to_end_completes_with_empty_text() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 10);

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let engine = Arc::new(MockSttEngine::silent());
        let provider = Arc::new(MockModelProvider::with_engine(
            Arc::clone(&engine) as Arc<dyn SttEngine>
        ));

        run_job(
            &Job::new(&wav, "tiny", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();
        assert!(failed_messages(&events).is_empty(), "no Failed expected");

        // The full 10 s reached the engine, at 16 kHz.
        assert_eq!(*engine.audio_lens.lock().unwrap(), vec![160_000]);

        let JobEvent::Completed(transcript) = events.last().unwrap() else {
            panic!("expected Completed");
        };
        assert!(transcript.text.trim().is_empty());
        assert_eq!(transcript.source_duration, "0:10");
        assert_eq!(transcript.model, ModelKind::Tiny);
    }

    // -----------------------------------------------------------------------
    // run_job — pass-through and fallback properties
    // -----------------------------------------------------------------------

    #[test]
    fn wav_source_skips_the_extractor_entirely() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let provider = provider_with(MockSttEngine::silent());

        run_job(
            &Job::new(&wav, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        assert_eq!(extractor.call_count(), 0, "no temp file may be created");
        assert!(wav.exists(), "source must survive the job");
        let events = rx.drain_all();
        assert!(matches!(events.last(), Some(JobEvent::Completed(_))));
    }

    #[test]
    fn invalid_selections_behave_exactly_like_defaults() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let run = |model: &str, language: &str| {
            let (tx, rx) = event_channel();
            let extractor = MockExtractor::ok();
            let engine = MockSttEngine::silent();
            let provider = provider_with(engine);
            run_job(
                &Job::new(&wav, model, language),
                &extractor,
                provider.as_ref(),
                &tx,
            );
            let requested = provider.requests.lock().unwrap().clone();
            (requested, rx.drain_all())
        };

        let (models_bad, events_bad) = run("definitely-wrong", "klingon");
        let (models_def, events_def) = run("base", "auto");

        assert_eq!(models_bad, vec![ModelKind::Base]);
        assert_eq!(models_bad, models_def);
        assert_eq!(events_bad, events_def);
    }

    #[test]
    fn language_hint_is_forwarded_and_auto_maps_to_none() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let extractor = MockExtractor::ok();
        let engine = Arc::new(MockSttEngine::silent());
        let provider = Arc::new(MockModelProvider::with_engine(
            Arc::clone(&engine) as Arc<dyn SttEngine>
        ));

        let (tx, _rx) = event_channel();
        run_job(
            &Job::new(&wav, "base", "es"),
            &extractor,
            provider.as_ref(),
            &tx,
        );
        run_job(
            &Job::new(&wav, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let hints = engine.hints.lock().unwrap();
        assert_eq!(*hints, vec![Some("es".to_string()), None]);
    }

    // -----------------------------------------------------------------------
    // run_job — failure paths
    // -----------------------------------------------------------------------

    #[test]
    fn missing_source_emits_one_failed_and_never_loads_a_model() {
        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let provider = provider_with(MockSttEngine::silent());

        run_job(
            &Job::new("/nonexistent/clip.mp4", "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();
        let failed = failed_messages(&events);
        assert_eq!(failed.len(), 1, "exactly one Failed event: {events:?}");
        assert!(failed[0].contains("not found"));
        assert!(matches!(events.last(), Some(JobEvent::Failed(_))));
        assert!(!events.iter().any(|e| matches!(e, JobEvent::Completed(_))));

        assert_eq!(extractor.call_count(), 0);
        assert_eq!(provider.request_count(), 0, "load_model must not run");
    }

    #[test]
    fn extractor_failure_embeds_the_tool_diagnostic() {
        let dir = tempdir().unwrap();
        let mp4 = dir.path().join("clip.mp4");
        std::fs::write(&mp4, b"x").unwrap();

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::failing("moov atom not found");
        let provider = provider_with(MockSttEngine::silent());

        run_job(
            &Job::new(&mp4, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();
        let failed = failed_messages(&events);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].contains("moov atom not found"));
        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn model_load_failure_fails_job_and_cleans_temp() {
        let dir = tempdir().unwrap();
        let mp4 = dir.path().join("clip.mp4");
        std::fs::write(&mp4, b"x").unwrap();

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let provider = Arc::new(MockModelProvider::failing(SttError::ModelNotFound(
            "/models/ggml-base.bin".into(),
        )));

        run_job(
            &Job::new(&mp4, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();
        let failed = failed_messages(&events);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].contains("ggml-base.bin"));

        let temp = extractor.last_temp.lock().unwrap().clone().unwrap();
        assert!(!temp.exists(), "temp WAV must be gone after failure");
    }

    #[test]
    fn transcription_failure_fails_job_and_cleans_temp() {
        let dir = tempdir().unwrap();
        let mp4 = dir.path().join("clip.mp4");
        std::fs::write(&mp4, b"x").unwrap();

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let provider = provider_with(MockSttEngine::err(SttError::Transcription(
            "inference blew up".into(),
        )));

        run_job(
            &Job::new(&mp4, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        let events = rx.drain_all();
        let failed = failed_messages(&events);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].contains("inference blew up"));

        let temp = extractor.last_temp.lock().unwrap().clone().unwrap();
        assert!(!temp.exists(), "temp WAV must be gone after failure");
    }

    #[test]
    fn successful_job_cleans_temp_too() {
        let dir = tempdir().unwrap();
        let mp4 = dir.path().join("clip.mp4");
        std::fs::write(&mp4, b"x").unwrap();

        let (tx, rx) = event_channel();
        let extractor = MockExtractor::ok();
        let provider = provider_with(MockSttEngine::silent());

        run_job(
            &Job::new(&mp4, "base", "auto"),
            &extractor,
            provider.as_ref(),
            &tx,
        );

        assert!(matches!(rx.drain_all().last(), Some(JobEvent::Completed(_))));
        let temp = extractor.last_temp.lock().unwrap().clone().unwrap();
        assert!(!temp.exists(), "temp WAV must be gone after success");
    }

    // -----------------------------------------------------------------------
    // JobRunner — submission discipline
    // -----------------------------------------------------------------------

    /// Engine that blocks inside `transcribe` until the paired sender is
    /// dropped or signalled, so tests can hold a job "running".
    #[derive(Debug)]
    struct GatedEngine {
        gate: Mutex<Option<std::sync::mpsc::Receiver<()>>>,
    }

    impl GatedEngine {
        fn new() -> (std::sync::mpsc::Sender<()>, Self) {
            let (tx, rx) = std::sync::mpsc::channel();
            (
                tx,
                Self {
                    gate: Mutex::new(Some(rx)),
                },
            )
        }
    }

    impl SttEngine for GatedEngine {
        fn transcribe(
            &self,
            _audio: &[f32],
            _language: Option<&str>,
        ) -> Result<TranscriptionResult, SttError> {
            if let Some(rx) = self.gate.lock().unwrap().take() {
                // Blocks until the test releases or drops the sender.
                let _ = rx.recv();
            }
            Ok(TranscriptionResult {
                text: String::new(),
                segments: Vec::new(),
                language: None,
                duration_ms: 1,
            })
        }
    }

    async fn wait_until_terminal(rx: &EventReceiver, collected: &mut Vec<JobEvent>) {
        for _ in 0..500 {
            collected.extend(rx.drain_all());
            if collected.iter().any(JobEvent::is_terminal) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("no terminal event within 5 s; got {collected:?}");
    }

    #[tokio::test]
    async fn second_submit_while_running_is_rejected() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let (gate_tx, engine) = GatedEngine::new();
        let provider: Arc<dyn ModelProvider> =
            Arc::new(MockModelProvider::with_engine(Arc::new(engine)));
        let (tx, rx) = event_channel();

        let runner = JobRunner::new(
            tokio::runtime::Handle::current(),
            Arc::new(MockExtractor::ok()),
            provider,
            tx,
        );

        runner.submit(Job::new(&wav, "base", "auto")).unwrap();
        assert!(runner.is_busy());

        // The first job is parked inside transcribe; a second submission
        // must be rejected without starting anything.
        let err = runner.submit(Job::new(&wav, "base", "auto")).unwrap_err();
        assert_eq!(err, SubmitError::Busy);

        // Release the gate; the job finishes and the runner frees up.
        drop(gate_tx);
        let mut events = Vec::new();
        wait_until_terminal(&rx, &mut events).await;

        let completed = events
            .iter()
            .filter(|e| matches!(e, JobEvent::Completed(_)))
            .count();
        assert_eq!(completed, 1, "exactly one job ran: {events:?}");

        // A new submission is accepted again.
        for _ in 0..500 {
            if !runner.is_busy() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        runner.submit(Job::new(&wav, "base", "auto")).unwrap();
        let mut events = Vec::new();
        wait_until_terminal(&rx, &mut events).await;
    }

    #[tokio::test]
    async fn submit_runs_job_to_completion_in_background() {
        let dir = tempdir().unwrap();
        let wav = silent_wav(dir.path(), 1);

        let provider: Arc<dyn ModelProvider> =
            Arc::new(MockModelProvider::with_engine(Arc::new(
                MockSttEngine::with_segments(&[" background"]),
            )));
        let (tx, rx) = event_channel();

        let runner = JobRunner::new(
            tokio::runtime::Handle::current(),
            Arc::new(MockExtractor::ok()),
            provider,
            tx,
        );

        runner.submit(Job::new(&wav, "small", "en")).unwrap();

        let mut events = Vec::new();
        wait_until_terminal(&rx, &mut events).await;

        let JobEvent::Completed(transcript) = events.last().unwrap() else {
            panic!("expected Completed, got {:?}", events.last());
        };
        assert_eq!(transcript.text, "background");
        assert_eq!(transcript.model, ModelKind::Small);
    }

    #[tokio::test]
    async fn failed_job_frees_the_runner_for_the_next_submission() {
        let provider: Arc<dyn ModelProvider> =
            Arc::new(MockModelProvider::with_engine(Arc::new(MockSttEngine::silent())));
        let (tx, rx) = event_channel();

        let runner = JobRunner::new(
            tokio::runtime::Handle::current(),
            Arc::new(MockExtractor::ok()),
            provider,
            tx,
        );

        runner
            .submit(Job::new("/nonexistent/clip.mp4", "base", "auto"))
            .unwrap();

        let mut events = Vec::new();
        wait_until_terminal(&rx, &mut events).await;
        assert!(matches!(events.last(), Some(JobEvent::Failed(_))));

        for _ in 0..500 {
            if !runner.is_busy() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!runner.is_busy(), "busy flag must clear after failure");
    }
}
