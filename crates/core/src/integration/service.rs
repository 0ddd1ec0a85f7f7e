//! Integration orchestrator.
//!
//! Drives one campaign through the platform pipeline, strictly in order:
//! authenticate, sync reference dictionaries, find blocks, map commercials,
//! reserve spots. Every platform call is awaited before the next one is
//! issued. A service instance holds the state of exactly one run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::campaign::{Campaign, Creative, Placement, ReferenceNames};
use crate::config::{IntegrationConfig, PlatformConfig, SpotFailurePolicy};
use crate::mapping::{EntityKind, IdentifierCache};
use crate::metrics::{
    INTEGRATION_DURATION, INTEGRATION_FAILURES, INTEGRATION_RUNS, SPOTS_RESERVED, SPOT_FAILURES,
};
use crate::platform::{
    collect_pages, Block, BroadcastPlatform, Commercial, Credentials, ListQuery, MediaPlan,
    ReferenceEntity, Session, SpotRequest,
};
use crate::progress::{NoopObserver, ProgressEntry, ProgressLog, ProgressObserver};

use super::diagnostics::DiagnosticRequest;
use super::types::{
    IntegrationError, IntegrationResult, IntegrationStatus, ReservationOutcome, RunPhase,
};

/// Number of trailing progress entries attached to error reports.
const DIAGNOSTIC_TRAIL: usize = 3;

/// What the pipeline gathered before assembling the result.
#[derive(Debug, Default)]
struct PipelineSummary {
    created_ids: Vec<u64>,
    matched_ids: Vec<u64>,
    reservation_failures: Vec<String>,
}

/// Runs the campaign publishing pipeline against one platform connection.
pub struct IntegrationService {
    platform: Arc<dyn BroadcastPlatform>,
    credentials: Credentials,
    settings: IntegrationConfig,
    page_size: u32,
    max_pages: u32,
    references: ReferenceNames,
    observer: Arc<dyn ProgressObserver>,

    // Per-run state
    run_id: Uuid,
    phase: RunPhase,
    cache: IdentifierCache,
    progress: ProgressLog,
    media_plans: Option<Vec<MediaPlan>>,
}

impl IntegrationService {
    /// Create a service for one run. Preset mappings from `settings` are
    /// seeded into the identifier cache.
    pub fn new(
        platform: Arc<dyn BroadcastPlatform>,
        platform_config: &PlatformConfig,
        settings: IntegrationConfig,
    ) -> Result<Self, IntegrationError> {
        let mut cache = IdentifierCache::new();
        for kind in EntityKind::SYNC_ORDER {
            cache.seed(
                kind,
                settings
                    .mappings
                    .for_kind(kind)
                    .iter()
                    .map(|m| (m.local, m.remote)),
            )?;
        }

        Ok(Self {
            platform,
            credentials: Credentials {
                username: platform_config.username.clone(),
                password: platform_config.password.clone(),
            },
            settings,
            page_size: platform_config.page_size.max(1),
            max_pages: platform_config.max_pages.max(1),
            references: ReferenceNames::default(),
            observer: Arc::new(NoopObserver),
            run_id: Uuid::new_v4(),
            phase: RunPhase::Idle,
            cache,
            progress: ProgressLog::new(),
            media_plans: None,
        })
    }

    /// Names used to look up unmapped reference ids on the platform.
    pub fn with_references(mut self, references: ReferenceNames) -> Self {
        self.references = references;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn progress(&self) -> &ProgressLog {
        &self.progress
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    fn checkpoint(&mut self, phase: RunPhase, message: impl Into<String>) {
        let entry = ProgressEntry::new(phase.as_str(), phase.progress(), message);
        self.observer.on_progress(&entry);
        self.progress.push(entry);
    }

    // =========================================================================
    // Pipeline steps
    // =========================================================================

    /// Open a platform session with the configured credentials.
    pub async fn authenticate(&mut self) -> Result<Session, IntegrationError> {
        self.phase = RunPhase::Authenticating;
        debug!(run_id = %self.run_id, "Authenticating as '{}'", self.credentials.username);

        let session = self
            .platform
            .login(&self.credentials)
            .await
            .map_err(|e| {
                if e.is_auth() {
                    IntegrationError::Auth(e.to_string())
                } else {
                    IntegrationError::Request(e)
                }
            })?;

        self.checkpoint(
            RunPhase::Authenticating,
            format!("Authenticated as {}", self.credentials.username),
        );
        Ok(session)
    }

    /// Map every reference id used by the campaign and creatives to its
    /// remote id. Ids already in the cache are not looked up again.
    ///
    /// With a default channel configured, channels that cannot be resolved
    /// by name stay unmapped and block search falls back to the default.
    pub async fn sync_reference_dictionaries(
        &mut self,
        campaign: &Campaign,
        creatives: &[Creative],
    ) -> Result<(), IntegrationError> {
        self.phase = RunPhase::SyncingDictionaries;

        let mut looked_up = 0usize;
        let mut cached = 0usize;
        let mut defaulted = 0usize;

        for kind in EntityKind::SYNC_ORDER {
            for local_id in campaign.referenced_ids(kind, creatives) {
                if self.cache.table(kind).contains(local_id) {
                    cached += 1;
                    continue;
                }

                let remote_id = match self.resolve_remote(kind, local_id).await {
                    Ok(remote_id) => remote_id,
                    Err(IntegrationError::Lookup { reason, .. })
                        if kind == EntityKind::Channel
                            && self.settings.default_channel_id.is_some() =>
                    {
                        debug!(
                            run_id = %self.run_id,
                            "Channel {} left unmapped ({}), using default channel",
                            local_id, reason
                        );
                        defaulted += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                self.cache.table_mut(kind).insert(local_id, remote_id)?;
                looked_up += 1;
            }
        }

        let mut message = format!(
            "Mapped {} reference ids ({} already known)",
            looked_up, cached
        );
        if defaulted > 0 {
            message.push_str(&format!(", {} channels on default", defaulted));
        }
        self.checkpoint(RunPhase::SyncingDictionaries, message);
        Ok(())
    }

    async fn resolve_remote(
        &self,
        kind: EntityKind,
        local_id: u64,
    ) -> Result<u64, IntegrationError> {
        let name = self
            .references
            .name_of(kind, local_id)
            .ok_or_else(|| IntegrationError::lookup(kind, local_id, "no local name to search by"))?;

        let remote = self.find_remote_by_name(kind, name).await?.ok_or_else(|| {
            IntegrationError::lookup(
                kind,
                local_id,
                format!("no remote {} named '{}'", kind, name),
            )
        })?;

        debug!(
            run_id = %self.run_id,
            "Mapped {} {} ('{}') -> {}",
            kind, local_id, name, remote.id
        );
        Ok(remote.id)
    }

    /// The platform filters names by substring, so every page of the
    /// filtered listing is searched for an exact (case-insensitive) match.
    async fn find_remote_by_name(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<ReferenceEntity>, IntegrationError> {
        let platform = Arc::clone(&self.platform);
        let candidates = collect_pages(
            move |query| {
                let platform = Arc::clone(&platform);
                async move {
                    match kind {
                        EntityKind::Advertiser => platform.list_advertisers(&query).await,
                        EntityKind::Brand => platform.list_brands(&query).await,
                        EntityKind::Channel => platform.list_channels(&query).await,
                        EntityKind::TargetAudience => {
                            platform.list_target_audiences(&query).await
                        }
                    }
                }
            },
            ListQuery::new()
                .with_name(name)
                .with_page(1, self.page_size),
            self.max_pages,
        )
        .await?;

        Ok(candidates
            .into_iter()
            .find(|entity| entity.name.eq_ignore_ascii_case(name)))
    }

    /// Blocks available to a placement, in booking grid order.
    ///
    /// At most `max_slots_per_program` available slots are taken from each
    /// program release; each one is fetched in full.
    pub async fn find_blocks_for_placement(
        &mut self,
        placement: &Placement,
    ) -> Result<Vec<Block>, IntegrationError> {
        self.phase = RunPhase::FindingBlocks;

        let channel_id = self
            .cache
            .channels
            .get(placement.channel_id)
            .or(self.settings.default_channel_id)
            .ok_or_else(|| {
                IntegrationError::lookup(
                    EntityKind::Channel,
                    placement.channel_id,
                    "channel is not mapped and no default channel is configured",
                )
            })?;

        let grid = self
            .platform
            .booking_grid(channel_id, &placement.date_range)
            .await?;

        let cap = self.settings.max_slots_per_program;
        let mut blocks = Vec::new();
        for day in &grid.days {
            for program in &day.programs {
                for slot in program.slots.iter().filter(|s| s.available).take(cap) {
                    blocks.push(self.platform.block(slot.id).await?);
                }
            }
        }

        debug!(
            run_id = %self.run_id,
            "Placement {}: {} blocks on channel {} for {}",
            placement.id,
            blocks.len(),
            channel_id,
            placement.date_range
        );
        Ok(blocks)
    }

    /// Remote commercials whose id equals one of the creative ids.
    pub async fn find_and_map_commercials(
        &mut self,
        creatives: &[Creative],
    ) -> Result<Vec<Commercial>, IntegrationError> {
        self.phase = RunPhase::MappingCommercials;

        let wanted: HashSet<u64> = creatives.iter().map(|c| c.id).collect();
        let platform = Arc::clone(&self.platform);
        let catalog = collect_pages(
            move |query| {
                let platform = Arc::clone(&platform);
                async move { platform.list_commercials(&query).await }
            },
            ListQuery::new().with_page(1, self.page_size),
            self.max_pages,
        )
        .await?;

        Ok(catalog
            .into_iter()
            .filter(|commercial| wanted.contains(&commercial.id))
            .collect())
    }

    async fn media_plans(&mut self) -> Result<&[MediaPlan], IntegrationError> {
        if self.media_plans.is_none() {
            let platform = Arc::clone(&self.platform);
            let plans = collect_pages(
                move |query| {
                    let platform = Arc::clone(&platform);
                    async move { platform.list_media_plans(&query).await }
                },
                ListQuery::new().with_page(1, self.page_size),
                self.max_pages,
            )
            .await?;
            self.media_plans = Some(plans);
        }

        Ok(self.media_plans.as_deref().unwrap_or_default())
    }

    fn select_media_plan<'a>(&self, plans: &'a [MediaPlan], block: &Block) -> Option<&'a MediaPlan> {
        match self.settings.target_media_plan_id {
            Some(target) => plans.iter().find(|plan| plan.id == target),
            None => plans.iter().find(|plan| {
                plan.date_range
                    .map(|range| range.contains(block.date))
                    .unwrap_or(false)
            }),
        }
    }

    /// Attach one spot to `block` under the selected media plan.
    ///
    /// A refusal from the platform is logged with a replayable request and
    /// returned as [`ReservationOutcome::Failed`]; only errors while reading
    /// the media plan catalog propagate.
    pub async fn reserve_spots(
        &mut self,
        block: &Block,
        matched: &[Commercial],
    ) -> Result<ReservationOutcome, IntegrationError> {
        self.phase = RunPhase::ReservingSpots;

        let plans = self.media_plans().await?.to_vec();
        let Some(plan) = self.select_media_plan(&plans, block) else {
            return Ok(ReservationOutcome::NothingToReserve {
                reason: match self.settings.target_media_plan_id {
                    Some(id) => format!("media plan {} not found", id),
                    None => format!("no media plan covers {}", block.date),
                },
            });
        };

        let matched_ids: HashSet<u64> = matched.iter().map(|c| c.id).collect();
        let commercial_id = plan
            .commercial_ids
            .iter()
            .copied()
            .find(|id| matched_ids.contains(id))
            .or_else(|| plan.commercial_ids.first().copied());

        let Some(commercial_id) = commercial_id else {
            return Ok(ReservationOutcome::NothingToReserve {
                reason: format!("media plan {} has no commercials", plan.id),
            });
        };

        let request = SpotRequest {
            commercial_id,
            media_plan_id: plan.id,
        };

        match self.platform.attach_spot(block.id, &request).await {
            Ok(spot) => {
                info!(
                    run_id = %self.run_id,
                    "Reserved spot {} in block {} (commercial {}, media plan {})",
                    spot.id, block.id, commercial_id, plan.id
                );
                SPOTS_RESERVED.inc();
                Ok(ReservationOutcome::Reserved(vec![spot]))
            }
            Err(e) => {
                let token = self.platform.current_token().await;
                let diagnostic = DiagnosticRequest::attach_spot(
                    &self.platform.base_url(),
                    token.as_deref(),
                    block.id,
                    &request,
                );
                warn!(
                    run_id = %self.run_id,
                    "Failed to attach spot to block {}: {}. Reproduce with: {}",
                    block.id, e, diagnostic
                );
                SPOT_FAILURES.inc();
                Ok(ReservationOutcome::Failed {
                    message: e.to_string(),
                    diagnostic,
                })
            }
        }
    }

    // =========================================================================
    // Whole run
    // =========================================================================

    /// Publish a campaign. Never returns an error: failures are reported in
    /// the result together with the trailing progress entries.
    pub async fn handle_campaign_publish(
        &mut self,
        campaign: &Campaign,
        creatives: &[Creative],
    ) -> IntegrationResult {
        let started = Instant::now();
        info!(
            run_id = %self.run_id,
            "Publishing campaign {} ('{}') with {} placements and {} creatives",
            campaign.id,
            campaign.name,
            campaign.placements.len(),
            creatives.len()
        );

        let result = match self.run_pipeline(campaign, creatives).await {
            Ok(summary) => self.finish(summary),
            Err(e) => self.fail(e),
        };

        let status = result.status.as_str();
        INTEGRATION_RUNS.with_label_values(&[status]).inc();
        INTEGRATION_DURATION
            .with_label_values(&[status])
            .observe(started.elapsed().as_secs_f64());

        info!(
            run_id = %self.run_id,
            "Campaign {} publish finished: {}",
            campaign.id, status
        );
        result
    }

    async fn run_pipeline(
        &mut self,
        campaign: &Campaign,
        creatives: &[Creative],
    ) -> Result<PipelineSummary, IntegrationError> {
        campaign.validate()?;

        self.authenticate().await?;
        self.sync_reference_dictionaries(campaign, creatives).await?;

        let mut targets: Vec<(u64, Vec<Block>)> = Vec::new();
        for placement in campaign.placements_by_priority() {
            let blocks = self.find_blocks_for_placement(placement).await?;
            targets.push((placement.id, blocks));
        }
        let block_count: usize = targets.iter().map(|(_, blocks)| blocks.len()).sum();
        self.checkpoint(
            RunPhase::FindingBlocks,
            format!(
                "Found {} blocks for {} placements",
                block_count,
                targets.len()
            ),
        );

        let matched = self.find_and_map_commercials(creatives).await?;
        self.checkpoint(
            RunPhase::MappingCommercials,
            format!(
                "Matched {} of {} creatives to commercials",
                matched.len(),
                creatives.len()
            ),
        );

        self.phase = RunPhase::ReservingSpots;
        let mut summary = PipelineSummary {
            matched_ids: matched.iter().map(|c| c.id).collect(),
            ..PipelineSummary::default()
        };

        for (placement_id, blocks) in &targets {
            let Some(block) = blocks.first() else {
                debug!(run_id = %self.run_id, "Placement {} has no available blocks", placement_id);
                continue;
            };

            let outcome = self.reserve_spots(block, &matched).await?;
            summary.created_ids.extend(outcome.spot_ids());
            match outcome {
                ReservationOutcome::Reserved(_) => {}
                ReservationOutcome::NothingToReserve { reason } => {
                    info!(
                        run_id = %self.run_id,
                        "Nothing reserved for placement {}: {}",
                        placement_id, reason
                    );
                }
                ReservationOutcome::Failed { message, .. } => {
                    match self.settings.spot_failure_policy {
                        SpotFailurePolicy::Fail => {
                            return Err(IntegrationError::SpotRejected {
                                block_id: block.id,
                                message,
                            });
                        }
                        SpotFailurePolicy::Partial => summary
                            .reservation_failures
                            .push(format!("block {}: {}", block.id, message)),
                    }
                }
            }
        }

        self.checkpoint(
            RunPhase::ReservingSpots,
            format!(
                "Reserved {} spots ({} refused)",
                summary.created_ids.len(),
                summary.reservation_failures.len()
            ),
        );

        Ok(summary)
    }

    fn finish(&mut self, summary: PipelineSummary) -> IntegrationResult {
        self.phase = RunPhase::Complete;

        let partial = !summary.reservation_failures.is_empty();
        let message = if partial {
            format!(
                "Completed with {} refused spots",
                summary.reservation_failures.len()
            )
        } else {
            "Campaign published".to_string()
        };
        self.checkpoint(RunPhase::Complete, message);

        IntegrationResult {
            run_id: self.run_id,
            success: true,
            status: if partial {
                IntegrationStatus::Partial
            } else {
                IntegrationStatus::Complete
            },
            created_ids: Some(summary.created_ids),
            matched_ids: Some(summary.matched_ids),
            error: partial.then(|| summary.reservation_failures.join("; ")),
            details: partial.then(|| self.progress.last(DIAGNOSTIC_TRAIL)),
        }
    }

    fn fail(&mut self, error: IntegrationError) -> IntegrationResult {
        let failed_in = self.phase;
        self.phase = RunPhase::Failed;

        let message = error.to_string();
        warn!(
            run_id = %self.run_id,
            "Integration failed during {}: {}",
            failed_in.as_str(),
            message
        );
        INTEGRATION_FAILURES
            .with_label_values(&[failed_in.as_str()])
            .inc();

        self.checkpoint(RunPhase::Failed, message.clone());

        IntegrationResult {
            run_id: self.run_id,
            success: false,
            status: IntegrationStatus::Failed,
            created_ids: None,
            matched_ids: None,
            error: Some(message),
            details: Some(self.progress.last(DIAGNOSTIC_TRAIL)),
        }
    }
}
