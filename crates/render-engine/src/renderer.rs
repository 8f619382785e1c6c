//! Renderer: runs one job from probe to final file.
//!
//! Stages run in a fixed order and drive the [`JobState`] machine:
//!
//! ```text
//! Pending -> Extracting -> Compositing -> SilentEncoded -> Muxed | SilentKept -> Completed
//! ```
//!
//! Any stage before the mux may fail the job. The mux stage never does;
//! it falls back to the silent render. The job's scratch directory is
//! removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use beatcut_common::{
    AppConfig, BeatcutError, BeatcutResult, EngineConfig, RenderError, RenderStage, Stopwatch,
};
use beatcut_project_model::{
    BeatVideoRequest, HeadTailRequest, JobRequest, JobState, PipLayout, PipRequest, PipText,
    RenderJob, RenderOutput,
};
use uuid::Uuid;

use crate::audio::AudioMixer;
use crate::cancel::CancellationToken;
use crate::compositor::TimelineAssembler;
use crate::engine::{EncodeProgress, EngineInfo, MediaEngine};
use crate::extractor::SegmentExtractor;
use crate::loader::SourceLoader;
use crate::mux::{MuxOutcome, Muxer};
use crate::plan::{preview_beat_windows, BeatPreview, JobPlan};
use crate::scratch::ScratchDir;
use crate::status::{JobStatus, LoggingSink, StatusSink};
use crate::still::{BeatStill, StillRenderer};

const SILENT_FILE: &str = "silent.mp4";
const AUDIO_FILE: &str = "audio.wav";

/// Executes render jobs against one validated engine.
pub struct Renderer {
    engine: Arc<dyn MediaEngine>,
    config: EngineConfig,
    muxer: Muxer,
    status: Arc<dyn StatusSink>,
    output_dir: PathBuf,
    scratch_root: PathBuf,
    parallel_extraction: bool,
}

impl Renderer {
    pub fn new(engine: Arc<dyn MediaEngine>, config: &AppConfig) -> Self {
        Self {
            engine,
            config: config.engine.clone(),
            muxer: Muxer::from_config(&config.engine),
            status: Arc::new(LoggingSink),
            output_dir: config.output_dir.clone(),
            scratch_root: config.scratch_root.clone(),
            parallel_extraction: config.workers.parallel_extraction,
        }
    }

    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    pub fn with_muxer(mut self, muxer: Muxer) -> Self {
        self.muxer = muxer;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Check the engine once before accepting jobs.
    pub fn validate(&self) -> BeatcutResult<EngineInfo> {
        self.engine.validate()
    }

    /// A new job writing into the configured output directory.
    pub fn job(&self, request: JobRequest) -> RenderJob {
        RenderJob::new(request, &self.output_dir)
    }

    /// Run `job` to completion.
    pub fn run(&self, job: &RenderJob, cancel: &CancellationToken) -> Result<RenderOutput, RenderError> {
        let stopwatch = Stopwatch::start();
        let mut tracker = StateTracker::new(job.id, self.status.as_ref());
        tracing::info!(
            job_id = %job.id,
            kind = job.request.kind_name(),
            output = %job.output_path().display(),
            "Render job started"
        );

        let result = ScratchDir::create(&self.scratch_root, job.id)
            .map_err(|e| RenderError::at(RenderStage::Probing, &e))
            .and_then(|scratch| {
                let result = self.execute(job, cancel, &scratch, &mut tracker);
                if let Err(e) = scratch.close() {
                    tracing::warn!(job_id = %job.id, error = %e, "Scratch cleanup failed");
                }
                result
            });

        match result {
            Ok(output) => {
                tracker.complete(output.clone());
                tracing::info!(
                    job_id = %job.id,
                    output = %output.path.display(),
                    has_audio = output.has_audio,
                    duration_secs = output.duration_secs,
                    elapsed_secs = stopwatch.elapsed_secs(),
                    "Render job completed"
                );
                Ok(output)
            }
            Err(err) => {
                tracker.fail(err.clone());
                tracing::error!(
                    job_id = %job.id,
                    stage = %err.stage,
                    error = %err.message,
                    elapsed_secs = stopwatch.elapsed_secs(),
                    "Render job failed"
                );
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        job: &RenderJob,
        cancel: &CancellationToken,
        scratch: &ScratchDir,
        tracker: &mut StateTracker<'_>,
    ) -> Result<RenderOutput, RenderError> {
        let engine = self.engine.as_ref();

        tracker.advance(JobState::Extracting)?;
        let plan = cancel
            .check()
            .and_then(|()| JobPlan::prepare(&job.request, &SourceLoader::new(engine), &self.config))
            .map_err(|e| RenderError::at(RenderStage::Probing, &e))?;

        let segments = cancel
            .check()
            .and_then(|()| {
                SegmentExtractor::new(engine)
                    .parallel(self.parallel_extraction)
                    .extract_all(plan.requests(), scratch.path())
            })
            .map_err(|e| RenderError::at(RenderStage::Extracting, &e))?;

        tracker.advance(JobState::Compositing)?;
        let composition = cancel
            .check()
            .and_then(|()| plan.timeline(segments))
            .and_then(|timeline| TimelineAssembler::new(self.config.fps).assemble(&timeline))
            .map_err(|e| RenderError::at(RenderStage::Compositing, &e))?;

        let silent = scratch.file(SILENT_FILE);
        let job_id = job.id;
        let report: &dyn Fn(EncodeProgress) = &move |p: EncodeProgress| {
            tracing::debug!(
                job_id = %job_id,
                progress = p.progress,
                frames = p.frames_rendered,
                total_frames = p.total_frames,
                eta_secs = p.eta_secs,
                "Encoding"
            );
        };
        cancel
            .check()
            .and_then(|()| engine.encode(&composition, &silent, Some(report)))
            .and_then(|()| {
                if silent.is_file() {
                    Ok(())
                } else {
                    Err(BeatcutError::encode(format!(
                        "engine produced no output at {}",
                        silent.display()
                    )))
                }
            })
            .map_err(|e| RenderError::at(RenderStage::Encoding, &e))?;
        tracker.advance(JobState::SilentEncoded)?;

        cancel
            .check()
            .map_err(|e| RenderError::at(RenderStage::Muxing, &e))?;
        let audio = job.request.music().and_then(|music| {
            AudioMixer::new(engine).prepare(music, composition.duration_secs, &scratch.file(AUDIO_FILE))
        });
        let output_path = job.output_path();
        let outcome = self
            .muxer
            .finalize(&silent, audio.as_ref().map(|a| a.path.as_path()), &output_path)
            .map_err(|e| RenderError::at(RenderStage::Muxing, &e))?;
        match &outcome {
            MuxOutcome::Muxed => tracker.advance(JobState::Muxed)?,
            MuxOutcome::SilentKept { reason } => {
                if audio.is_some() {
                    tracing::warn!(job_id = %job.id, reason = %reason, "Output kept without audio");
                }
                tracker.advance(JobState::SilentKept)?
            }
        }

        Ok(RenderOutput {
            path: output_path,
            filename: job.output_filename(),
            has_audio: outcome.has_audio(),
            duration_secs: composition.duration_secs,
        })
    }

    /// Beat cuts of `source_a`, then `source_b` sped up under a timer.
    pub fn render_beat_video(
        &self,
        source_a: impl Into<PathBuf>,
        source_b: impl Into<PathBuf>,
        beat_times: Vec<f64>,
        speed_factor: f64,
        font_size: u32,
        music: Option<PathBuf>,
    ) -> Result<RenderOutput, RenderError> {
        let job = self.job(JobRequest::BeatVideo(BeatVideoRequest {
            source_a: source_a.into(),
            source_b: source_b.into(),
            beat_times,
            speed_factor,
            font_size,
            music,
        }));
        self.run(&job, &CancellationToken::new())
    }

    /// `overlay` drawn over `main`, both cut to the shorter source.
    pub fn render_picture_in_picture(
        &self,
        main: impl Into<PathBuf>,
        overlay: impl Into<PathBuf>,
        layout: PipLayout,
        text: Option<PipText>,
        music: Option<PathBuf>,
    ) -> Result<RenderOutput, RenderError> {
        let job = self.job(JobRequest::PictureInPicture(PipRequest {
            main: main.into(),
            overlay: overlay.into(),
            layout,
            overlay_window: None,
            text,
            music,
        }));
        self.run(&job, &CancellationToken::new())
    }

    /// The first `segment_secs` of `first`, then the last of `second`.
    pub fn render_head_tail(
        &self,
        first: impl Into<PathBuf>,
        second: impl Into<PathBuf>,
        segment_secs: f64,
        music: Option<PathBuf>,
    ) -> Result<RenderOutput, RenderError> {
        let job = self.job(JobRequest::HeadTail(HeadTailRequest {
            first: first.into(),
            second: second.into(),
            segment_secs,
            music,
        }));
        self.run(&job, &CancellationToken::new())
    }

    /// Probe `source` and report a window around each beat. Renders nothing.
    pub fn preview_beat_windows(
        &self,
        source: &Path,
        beat_times: &[f64],
        window_secs: f64,
    ) -> Result<Vec<BeatPreview>, RenderError> {
        let media = SourceLoader::new(self.engine.as_ref())
            .probe(source)
            .map_err(|e| RenderError::at(RenderStage::Probing, &e))?;
        Ok(preview_beat_windows(&media, beat_times, window_secs))
    }

    /// Write the frame `offset_secs` into beat cut `index` of `source` as a PNG.
    pub fn render_beat_still(
        &self,
        source: &Path,
        beat_times: &[f64],
        index: usize,
        offset_secs: f64,
        out: &Path,
    ) -> Result<BeatStill, RenderError> {
        let media = SourceLoader::new(self.engine.as_ref())
            .probe(source)
            .map_err(|e| RenderError::at(RenderStage::Probing, &e))?;
        let scratch = ScratchDir::create(&self.scratch_root, Uuid::new_v4())
            .map_err(|e| RenderError::at(RenderStage::Extracting, &e))?;
        let result = StillRenderer::new(self.engine.as_ref(), &self.config)
            .render(media, beat_times, index, offset_secs, scratch.path(), out)
            .map_err(|e| {
                let stage = match &e {
                    BeatcutError::Encode { .. } => RenderStage::Encoding,
                    _ => RenderStage::Extracting,
                };
                RenderError::at(stage, &e)
            });
        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "Scratch cleanup failed");
        }
        result
    }
}

/// Current job state plus the status writes that go with it.
struct StateTracker<'a> {
    job_id: Uuid,
    state: JobState,
    progress: u8,
    sink: &'a dyn StatusSink,
}

impl<'a> StateTracker<'a> {
    fn new(job_id: Uuid, sink: &'a dyn StatusSink) -> Self {
        Self {
            job_id,
            state: JobState::Pending,
            progress: 0,
            sink,
        }
    }

    fn advance(&mut self, next: JobState) -> Result<(), RenderError> {
        self.state = self
            .state
            .transition(next)
            .map_err(|e| RenderError::new(stage_of(self.state), e.to_string()))?;
        if let Some(progress) = next.checkpoint() {
            self.progress = progress;
        }
        self.sink
            .update(JobStatus::new(self.job_id, self.state, self.progress));
        Ok(())
    }

    fn complete(&mut self, output: RenderOutput) {
        if let Err(e) = self.state.transition(JobState::Completed) {
            tracing::error!(job_id = %self.job_id, error = %e, "Cannot complete job");
            return;
        }
        self.state = JobState::Completed;
        self.progress = 100;
        let mut status = JobStatus::new(self.job_id, self.state, self.progress);
        status.output = Some(output);
        self.sink.update(status);
    }

    fn fail(&mut self, error: RenderError) {
        if !self.state.can_transition_to(JobState::Failed) {
            tracing::error!(job_id = %self.job_id, state = %self.state, "Cannot fail job");
            return;
        }
        self.state = JobState::Failed;
        self.progress = 0;
        let mut status = JobStatus::new(self.job_id, self.state, self.progress);
        status.error = Some(error);
        self.sink.update(status);
    }
}

fn stage_of(state: JobState) -> RenderStage {
    match state {
        JobState::Pending => RenderStage::Probing,
        JobState::Extracting => RenderStage::Extracting,
        JobState::Compositing => RenderStage::Compositing,
        JobState::SilentEncoded | JobState::Muxed | JobState::SilentKept => RenderStage::Muxing,
        JobState::Completed | JobState::Failed => RenderStage::Cleanup,
    }
}
