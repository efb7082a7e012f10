//! Production orchestration: the per-shot generation state machine.
//!
//! Shots are driven strictly in index order — shot *i+1* chains off shot
//! *i*'s end frame, so nothing runs in parallel across shots. Within one
//! shot, video and voice generation fan out concurrently and join before
//! the quality gate. A cancellation token is raced against every in-flight
//! external call, so no response is applied after cancellation.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use reelforge_gen_client::{DebugRequest, GenerationService, VideoGenRequest, VoiceRequest};
use reelforge_ledger::{CreditBillingGuard, CreditLedger};
use reelforge_models::{
    CharacterBible, ProductionState, Project, ProjectId, ProjectStatus, ShotId, ShotStatus,
    VisualDebugResult, VoiceStatus, VoiceTrack,
};
use reelforge_store::ProjectRepository;

use crate::cancel::{CancelSignal, CancelToken};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::progress::ProgressChannel;

/// Shared dependencies for one production run.
pub struct ProductionContext {
    pub service: Arc<dyn GenerationService>,
    pub store: Arc<dyn ProjectRepository>,
    pub guard: Arc<CreditBillingGuard>,
    pub progress: ProgressChannel,
    pub config: PipelineConfig,
}

impl ProductionContext {
    /// Wire up a context for a project.
    pub fn new(
        service: Arc<dyn GenerationService>,
        store: Arc<dyn ProjectRepository>,
        ledger: Arc<dyn CreditLedger>,
        project_id: ProjectId,
        config: PipelineConfig,
    ) -> Self {
        let progress = ProgressChannel::new(config.progress_buffer);
        let guard = Arc::new(CreditBillingGuard::new(ledger, project_id));
        Self {
            service,
            store,
            guard,
            progress,
            config,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every shot completed
    Completed,
    /// The run halted at a shot that exhausted its retries
    Halted { shot_id: ShotId },
    /// The run was cancelled; the in-flight shot reverted to pending
    Cancelled { shot_id: ShotId },
    /// A run was already in flight; this call was a no-op
    AlreadyRunning,
}

/// Outcome of one shot cycle, internal to the run loop.
enum ShotOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// Drives per-shot generation with frame chaining, seed lock, a
/// scoring-based retry gate, and cooperative cancellation.
pub struct ProductionOrchestrator {
    ctx: Arc<ProductionContext>,
    state: Arc<RwLock<ProductionState>>,
    cancel: CancelSignal,
}

impl ProductionOrchestrator {
    /// Create an orchestrator over an in-memory production state.
    pub fn new(ctx: Arc<ProductionContext>, state: ProductionState) -> Self {
        Self {
            ctx,
            state: Arc::new(RwLock::new(state)),
            cancel: CancelSignal::new(),
        }
    }

    /// Load a persisted run and reconcile it: any shot persisted as
    /// `generating` means the process died mid-call with the external
    /// outcome unknown, so it reverts to `pending` and resuming requires an
    /// explicit `start()`.
    pub async fn load(
        ctx: Arc<ProductionContext>,
        project_id: &ProjectId,
    ) -> PipelineResult<Option<Self>> {
        let Some(mut state) = ctx.store.load_production(project_id).await? else {
            return Ok(None);
        };

        let reconciled = state.reconcile();
        if reconciled > 0 {
            info!(
                project_id = %project_id,
                reconciled = reconciled,
                "Reconciled in-flight shots back to pending"
            );
            ctx.store.save_production(&state).await?;
        }

        Ok(Some(Self::new(ctx, state)))
    }

    /// Clone of the current production state.
    pub async fn snapshot(&self) -> ProductionState {
        self.state.read().await.clone()
    }

    /// Subscribe to progress events.
    pub fn progress(&self) -> &ProgressChannel {
        &self.ctx.progress
    }

    /// Request cooperative cancellation of the in-flight run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Start (or resume) the run.
    ///
    /// Preconditions: reference analysis complete and audit approved —
    /// violations fail with no side effects. A second call while a run is
    /// in flight is a no-op. The seed is locked on the first start and
    /// reused by every later resume.
    pub async fn start(&self) -> PipelineResult<RunOutcome> {
        self.cancel.reset();
        {
            let mut state = self.state.write().await;
            if !state.analysis_complete() {
                return Err(PipelineError::precondition(
                    "reference analysis is not complete",
                ));
            }
            if !state.audit_approved {
                return Err(PipelineError::precondition("audit has not been approved"));
            }
            if state.running {
                return Ok(RunOutcome::AlreadyRunning);
            }
            state.running = true;
            let seed = state.chain_context.lock_seed(rand::random());
            state.touch();
            info!(project_id = %state.project_id, seed = seed, "Production run starting");
        }

        self.drive().await
    }

    /// Re-enter the admission cycle for failed shots only, in original
    /// order. Completed shots are never re-run or re-billed; reset shots
    /// get a fresh attempt budget while keeping their recorded verdicts.
    pub async fn retry_failed_shots(&self) -> PipelineResult<RunOutcome> {
        self.cancel.reset();
        {
            let mut state = self.state.write().await;
            if !state.analysis_complete() {
                return Err(PipelineError::precondition(
                    "reference analysis is not complete",
                ));
            }
            if !state.audit_approved {
                return Err(PipelineError::precondition("audit has not been approved"));
            }
            if state.running {
                return Ok(RunOutcome::AlreadyRunning);
            }

            let failed = state.failed_indices();
            let Some(&first_failed) = failed.first() else {
                return Err(PipelineError::precondition("no failed shots to retry"));
            };

            for &index in &failed {
                state.shots[index].reset_for_retry();
            }
            state.current_shot_index = state.current_shot_index.min(first_failed);
            state.running = true;
            state.touch();
            info!(
                project_id = %state.project_id,
                shots = failed.len(),
                "Retrying failed shots"
            );
        }

        self.drive().await
    }

    /// Run the loop, then clear the run flag and persist no matter how the
    /// loop ended.
    async fn drive(&self) -> PipelineResult<RunOutcome> {
        let result = self.run_loop().await;

        {
            let mut state = self.state.write().await;
            state.running = false;
            state.touch();
        }
        if let Err(e) = self.persist_state().await {
            warn!("Failed to persist final run state: {}", e);
        }

        if let Ok(RunOutcome::Completed) = &result {
            let project_id = self.state.read().await.project_id.clone();
            if let Err(e) = self.ctx.store.archive_production(&project_id).await {
                warn!("Failed to archive completed run: {}", e);
            }
        }

        result
    }

    async fn run_loop(&self) -> PipelineResult<RunOutcome> {
        let mut token = self.cancel.token();
        let logger = {
            let state = self.state.read().await;
            RunLogger::new(&state.project_id, "production_run")
        };
        logger.log_start("driving shots in sequence");

        self.update_project(|p| p.set_status(ProjectStatus::Producing))
            .await?;
        self.persist_state().await?;

        loop {
            let (index, shot_id, status, total) = {
                let state = self.state.read().await;
                if state.current_shot_index >= state.shots.len() {
                    break;
                }
                let shot = &state.shots[state.current_shot_index];
                (
                    state.current_shot_index,
                    shot.id.clone(),
                    shot.status,
                    state.shots.len(),
                )
            };

            match status {
                ShotStatus::Completed => {
                    // Resume path: already produced, step past it.
                    let mut state = self.state.write().await;
                    state.current_shot_index += 1;
                    state.touch();
                    continue;
                }
                ShotStatus::Failed => {
                    // Cannot chain past a failed shot; stays halted until
                    // retry_failed_shots resets it.
                    self.ctx
                        .progress
                        .halted(format!("shot {} failed, run halted", shot_id));
                    self.update_project(|p| p.set_status(ProjectStatus::Failed))
                        .await?;
                    return Ok(RunOutcome::Halted { shot_id });
                }
                ShotStatus::Generating => {
                    // Stale flag from an unreconciled load.
                    let mut state = self.state.write().await;
                    state.shots[index].revert_to_pending();
                    state.touch();
                    continue;
                }
                ShotStatus::Pending => {}
            }

            self.ctx.progress.log(format!(
                "Producing shot {} ({}/{})",
                shot_id,
                index + 1,
                total
            ));

            match self.run_shot(index, &mut token).await? {
                ShotOutcome::Completed => {
                    let mut state = self.state.write().await;
                    state.current_shot_index += 1;
                    state.touch();
                    drop(state);
                    self.persist_state().await?;
                }
                ShotOutcome::Failed => {
                    self.ctx.progress.halted(format!(
                        "shot {} failed after exhausting retries",
                        shot_id
                    ));
                    self.update_project(|p| p.set_status(ProjectStatus::Failed))
                        .await?;
                    logger.log_error(&format!("run halted at shot {}", shot_id));
                    return Ok(RunOutcome::Halted { shot_id });
                }
                ShotOutcome::Cancelled => {
                    self.ctx.progress.cancelled(shot_id.clone());
                    metrics::record_cancellation();
                    logger.log_progress(&format!("run cancelled at shot {}", shot_id));
                    return Ok(RunOutcome::Cancelled { shot_id });
                }
            }
        }

        self.update_project(|p| p.set_status(ProjectStatus::Completed))
            .await?;
        self.ctx.progress.done();
        logger.log_completion("all shots completed");
        Ok(RunOutcome::Completed)
    }

    /// One shot cycle: admission, generation fan-out, quality gate with
    /// corrective retries, then commit or release.
    async fn run_shot(
        &self,
        index: usize,
        token: &mut CancelToken,
    ) -> PipelineResult<ShotOutcome> {
        // Admission: the balance check happens before any mutation, so a
        // halt here leaves the shot pending and the index unmoved.
        let (shot_id, tier) = {
            let state = self.state.read().await;
            (state.shots[index].id.clone(), state.quality_tier)
        };
        self.ctx.guard.check_and_reserve(&shot_id, tier).await?;

        if token.is_cancelled() {
            self.ctx.guard.release(&shot_id).await;
            return self.cancel_shot(index, &shot_id).await;
        }

        {
            let mut state = self.state.write().await;
            state.shots[index].begin_generating();
            state.touch();
        }
        self.persist_state().await?;
        self.ctx
            .progress
            .shot_status(shot_id.clone(), ShotStatus::Generating);

        let request_parts = self.build_request_parts(index).await?;
        let RequestParts {
            base_prompt,
            reference_frame_url,
            seed,
            character_bible,
            duration_seconds,
            dialogue,
            corrective_criteria,
        } = request_parts;

        let mut needs_voice = {
            let state = self.state.read().await;
            !dialogue.trim().is_empty()
                && state
                    .voice_track(&shot_id)
                    .map(|t| t.status != VoiceStatus::Completed)
                    .unwrap_or(true)
        };

        let max_attempts = self.ctx.config.max_shot_attempts.max(1);
        let mut corrective: Option<String> = None;
        let mut last_error = String::from("generation failed");

        for attempt in 1..=max_attempts {
            let prompt = match &corrective {
                Some(c) => format!("{}\nCORRECTION: {}", base_prompt, c),
                None => base_prompt.clone(),
            };

            let video_request = VideoGenRequest {
                shot_id: shot_id.clone(),
                prompt,
                reference_frame_url: reference_frame_url.clone(),
                seed,
                character_bible: character_bible.clone(),
                duration_seconds,
            };
            let voice_request = needs_voice.then(|| VoiceRequest {
                text: dialogue.clone(),
                voice_id: self.ctx.config.voice_id.clone(),
            });

            // Fan-out: video and voice generated concurrently, joined
            // before scoring. Voice has no ordering dependency on the
            // chain, only on the dialogue text.
            let service = &self.ctx.service;
            let joined = async {
                tokio::join!(service.generate_video(&video_request), async {
                    match &voice_request {
                        Some(req) => Some(service.generate_voice(req).await),
                        None => None,
                    }
                })
            };

            let (video_result, voice_result) = tokio::select! {
                _ = token.cancelled() => {
                    self.ctx.guard.release(&shot_id).await;
                    return self.cancel_shot(index, &shot_id).await;
                }
                results = joined => results,
            };

            // A good voice track settles independently of the video
            // verdict so later attempts reuse it.
            let mut voice_error = None;
            match voice_result {
                Some(Ok(voice)) => {
                    let mut state = self.state.write().await;
                    state.set_voice_track(VoiceTrack {
                        shot_id: shot_id.clone(),
                        status: VoiceStatus::Completed,
                        audio_url: Some(voice.audio_url),
                    });
                    needs_voice = false;
                }
                Some(Err(e)) => voice_error = Some(e.to_string()),
                None => {}
            }

            let video = match video_result {
                Ok(v) => v,
                Err(e) => {
                    last_error = format!("video generation failed: {}", e);
                    self.record_failed_attempt(index, attempt, max_attempts, &last_error)
                        .await?;
                    continue;
                }
            };
            if let Some(e) = voice_error {
                last_error = format!("voice generation failed: {}", e);
                self.record_failed_attempt(index, attempt, max_attempts, &last_error)
                    .await?;
                continue;
            }

            // Quality gate.
            let debug_request = DebugRequest {
                frame_or_clip_url: video.end_frame_url.clone(),
                character_bible: character_bible.clone(),
                corrective_criteria: corrective_criteria.clone(),
            };
            let verdict = tokio::select! {
                _ = token.cancelled() => {
                    self.ctx.guard.release(&shot_id).await;
                    return self.cancel_shot(index, &shot_id).await;
                }
                result = self.ctx.service.score_visual(&debug_request) => result,
            };

            let verdict = match verdict {
                Ok(v) => v,
                Err(e) => {
                    last_error = format!("visual debugger failed: {}", e);
                    self.record_failed_attempt(index, attempt, max_attempts, &last_error)
                        .await?;
                    continue;
                }
            };

            metrics::record_attempt(verdict.passed, verdict.score);
            self.ctx
                .progress
                .attempt_scored(shot_id.clone(), attempt, verdict.score, verdict.passed);

            if verdict.passed {
                {
                    let mut state = self.state.write().await;
                    let shot = &mut state.shots[index];
                    shot.record_debug_result(VisualDebugResult {
                        score: verdict.score,
                        passed: true,
                        corrective_prompt: None,
                    });
                    shot.complete(video.video_url.clone(), video.end_frame_url.clone());
                    state.chain_context.previous_frame_url = Some(video.end_frame_url.clone());
                    state.touch();
                }
                self.persist_state().await?;

                // Exactly one debit per completed shot, however many
                // attempts it took.
                self.ctx.guard.commit(&shot_id, tier).await?;
                metrics::record_commit(tier.credit_cost());

                self.update_project(|p| p.push_clip_url(video.video_url.clone()))
                    .await?;
                self.ctx
                    .progress
                    .shot_status(shot_id.clone(), ShotStatus::Completed);
                return Ok(ShotOutcome::Completed);
            }

            last_error = format!(
                "visual debugger rejected attempt {} (score {:.2})",
                attempt, verdict.score
            );
            corrective = verdict.corrective_prompt.clone();
            {
                let mut state = self.state.write().await;
                let shot = &mut state.shots[index];
                shot.record_debug_result(VisualDebugResult {
                    score: verdict.score,
                    passed: false,
                    corrective_prompt: verdict.corrective_prompt,
                });
                shot.retry_count += 1;
                state.touch();
            }
            self.persist_state().await?;
            if attempt < max_attempts {
                metrics::record_retry();
            }
        }

        // Retry budget exhausted: terminal failure, reservation released,
        // zero debit for this shot.
        {
            let mut state = self.state.write().await;
            state.shots[index].fail(&last_error);
            state.touch();
        }
        self.persist_state().await?;
        self.ctx.guard.release(&shot_id).await;
        self.ctx
            .progress
            .shot_status(shot_id.clone(), ShotStatus::Failed);
        Ok(ShotOutcome::Failed)
    }

    /// Revert an in-flight shot to pending on cancellation. Not an error:
    /// the index stays put so a later start resumes this shot cleanly.
    async fn cancel_shot(&self, index: usize, shot_id: &ShotId) -> PipelineResult<ShotOutcome> {
        {
            let mut state = self.state.write().await;
            state.shots[index].revert_to_pending();
            state.touch();
        }
        self.persist_state().await?;
        self.ctx
            .progress
            .shot_status(shot_id.clone(), ShotStatus::Pending);
        Ok(ShotOutcome::Cancelled)
    }

    /// Absorb a per-attempt generation error into the shot's verdict
    /// history and retry counter.
    async fn record_failed_attempt(
        &self,
        index: usize,
        attempt: u32,
        max_attempts: u32,
        error: &str,
    ) -> PipelineResult<()> {
        warn!(attempt = attempt, max_attempts = max_attempts, "{}", error);
        {
            let mut state = self.state.write().await;
            let shot = &mut state.shots[index];
            shot.record_debug_result(VisualDebugResult {
                score: 0.0,
                passed: false,
                corrective_prompt: None,
            });
            shot.retry_count += 1;
            state.touch();
        }
        self.persist_state().await?;
        metrics::record_attempt(false, 0.0);
        if attempt < max_attempts {
            metrics::record_retry();
        }
        Ok(())
    }

    /// Gather the per-shot request inputs under one read lock.
    async fn build_request_parts(&self, index: usize) -> PipelineResult<RequestParts> {
        let state = self.state.read().await;
        let shot = &state.shots[index];
        let anchor = state
            .master_anchor
            .as_ref()
            .ok_or_else(|| PipelineError::precondition("master anchor missing"))?;

        // Frame chaining: shot 0 starts from the anchor image, every later
        // shot from the previous shot's end frame.
        let reference_frame_url = if index == 0 {
            anchor.image_url.clone()
        } else {
            state
                .chain_context
                .previous_frame_url
                .clone()
                .or_else(|| {
                    state
                        .shots
                        .get(index - 1)
                        .and_then(|prev| prev.end_frame_url.clone())
                })
                .ok_or_else(|| {
                    PipelineError::generation("previous end frame missing, cannot chain")
                })?
        };

        let seed = state
            .chain_context
            .seed
            .ok_or_else(|| PipelineError::precondition("generation seed not locked"))?;

        Ok(RequestParts {
            base_prompt: format!("{}\nMood: {}", shot.description, shot.mood),
            reference_frame_url,
            seed,
            character_bible: anchor.character_bible.clone(),
            duration_seconds: shot.duration_seconds,
            dialogue: shot.dialogue.clone(),
            corrective_criteria: state.audit_corrective_prompts.clone(),
        })
    }

    async fn persist_state(&self) -> PipelineResult<()> {
        let snapshot = self.state.read().await.clone();
        self.ctx.store.save_production(&snapshot).await?;
        Ok(())
    }

    /// Apply a mutation to the project record, if one exists.
    async fn update_project<F>(&self, mutate: F) -> PipelineResult<()>
    where
        F: FnOnce(&mut Project),
    {
        let project_id = self.state.read().await.project_id.clone();
        if let Some(mut project) = self.ctx.store.load_project(&project_id).await? {
            mutate(&mut project);
            self.ctx.store.save_project(&project).await?;
        }
        Ok(())
    }
}

/// Inputs shared by every attempt of one shot.
struct RequestParts {
    base_prompt: String,
    reference_frame_url: String,
    seed: u64,
    character_bible: CharacterBible,
    duration_seconds: f64,
    dialogue: String,
    corrective_criteria: Vec<String>,
}
