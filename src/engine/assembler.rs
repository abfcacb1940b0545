//! Feed assembly pipeline. Orchestrates the collaborators and the scoring,
//! scheduling and mixing stages into paginated feed pages, with bounded
//! waits and degraded fallbacks so a slow collaborator never takes the feed
//! down with it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::constants::{MAX_PAGE_SIZE, REVIEW_ITEM_PRIORITY};
use crate::engine::config::EngineConfig;
use crate::engine::diversity::DiversityMixer;
use crate::engine::frequency::FrequencyIndex;
use crate::engine::scorer::ContentScorer;
use crate::engine::srs::{ReviewStats, SpacedRepetitionScheduler};
use crate::error::EngineError;
use crate::profile_cache::ProfileCache;
use crate::store::{CardStore, ContentSource, EngagementSink, ProfileStore};
use crate::types::{
    EngagementEvent, FeedItem, FeedOptions, FeedPage, LearnerProfile, ReviewCardItem,
    ReviewQuality, ScoreSignals, ScoredItem, VocabularyCard,
};
use crate::validation::{validate_content_id, validate_user_id, normalize_pagination};

pub struct FeedAssembler {
    config: Arc<RwLock<EngineConfig>>,
    frequency: Arc<FrequencyIndex>,
    content: Arc<dyn ContentSource>,
    profiles: Arc<dyn ProfileStore>,
    cards: Arc<dyn CardStore>,
    engagement: Arc<dyn EngagementSink>,
    profile_cache: Arc<ProfileCache>,
}

impl FeedAssembler {
    pub fn new(
        config: EngineConfig,
        frequency: Arc<FrequencyIndex>,
        content: Arc<dyn ContentSource>,
        profiles: Arc<dyn ProfileStore>,
        cards: Arc<dyn CardStore>,
        engagement: Arc<dyn EngagementSink>,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::validation)?;
        let ttl = Duration::from_secs(config.feed.profile_cache_ttl_secs);
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            frequency,
            content,
            profiles,
            cards,
            engagement,
            profile_cache: Arc::new(ProfileCache::new(ttl)),
        })
    }

    /// Swaps in a new configuration after validating it. Rejected configs
    /// leave the running one untouched.
    pub async fn reload_config(&self, config: EngineConfig) -> Result<(), EngineError> {
        config.validate().map_err(EngineError::validation)?;
        *self.config.write().await = config;
        info!("engine configuration reloaded");
        Ok(())
    }

    pub async fn config_snapshot(&self) -> EngineConfig {
        self.config.read().await.clone()
    }

    /// Builds one feed page for a learner.
    ///
    /// Every collaborator call runs under a timeout with a degraded
    /// fallback: a missing profile becomes a default one, unavailable
    /// candidates or due cards become empty sets. The only hard failures
    /// are input validation errors.
    pub async fn assemble_feed(
        &self,
        user_id: &str,
        options: FeedOptions,
    ) -> Result<FeedPage, EngineError> {
        validate_user_id(user_id)?;
        let (page, limit) = normalize_pagination(options.page, options.limit);
        let cfg = self.config.read().await.clone();
        let timeout_ms = cfg.feed.upstream_timeout_ms;
        let now = Utc::now();

        let mut profile = self.load_profile_cached(user_id, timeout_ms).await;
        if let Some(level) = options.level {
            profile.cefr_level = level;
        }
        if let Some(interests) = &options.interests {
            profile.interest_tags = interests.iter().cloned().collect();
        }

        match self
            .with_timeout(timeout_ms, "profiles", self.profiles.load_known_words(user_id))
            .await
        {
            Ok(known) => profile.known_words.extend(known),
            Err(err) => {
                warn!(user_id, error = %err, "known words unavailable, using profile set only")
            }
        }

        let due_cards = if options.include_reviews {
            match self
                .with_timeout(
                    timeout_ms,
                    "cards",
                    self.cards.load_due_cards(user_id, now, cfg.srs.due_card_cap),
                )
                .await
            {
                Ok(cards) => cards,
                Err(err) => {
                    warn!(user_id, error = %err, "due cards unavailable, feed continues without reviews");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let candidates = match self
            .with_timeout(
                timeout_ms,
                "aggregator",
                self.content.fetch_candidates(user_id, cfg.feed.candidate_limit),
            )
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(user_id, error = %err, "candidate fetch failed, serving reviews only");
                Vec::new()
            }
        };

        let signals = ScoreSignals {
            engagement_priors: engagement_priors(&profile, &cfg),
        };
        let scorer = ContentScorer::new(Arc::clone(&self.frequency), &cfg);
        let ranked = scorer.rank_content(candidates, &profile, &signals, now);
        let filtered = apply_coverage_cutoff(ranked, cfg.feed.coverage_cutoff, limit as usize);

        let mixer = DiversityMixer::new(cfg.diversity.clone());
        let diversified = mixer.diversify(filtered);

        // Content paginates; due reviews attach to the first page, so a
        // card is shown once per due cycle no matter how the content
        // slices.
        let content_total = diversified.len();
        let start = ((page - 1) * limit) as usize;
        let content_page: Vec<ScoredItem> = diversified
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();
        let has_more = (start + content_page.len()) < content_total;
        let reviews = if page == 1 {
            due_cards.iter().map(review_item).collect()
        } else {
            Vec::new()
        };
        let page_items = mixer.interleave_reviews(content_page, reviews);
        let total = (content_total + due_cards.len()) as u64;

        debug!(
            user_id,
            page,
            served = page_items.len(),
            total,
            reviews = due_cards.len(),
            "feed page assembled"
        );

        self.record_page_shown(user_id, &mut profile, &page_items, cfg.feed.engagement_history_cap)
            .await;

        Ok(FeedPage {
            items: page_items,
            page,
            limit,
            total,
            has_more,
        })
    }

    /// Applies one spaced-repetition review and persists the updated card.
    /// Reviews are writes, so persistence failures surface instead of
    /// degrading.
    pub async fn review_card(
        &self,
        user_id: &str,
        card_id: &str,
        quality: i32,
    ) -> Result<VocabularyCard, EngineError> {
        validate_user_id(user_id)?;
        validate_content_id(card_id)?;
        let quality = ReviewQuality::new(quality)?;

        let cfg = self.config.read().await.clone();
        let timeout_ms = cfg.feed.upstream_timeout_ms;

        let card = self
            .with_timeout(timeout_ms, "cards", self.cards.load_card(user_id, card_id))
            .await?
            .ok_or_else(|| EngineError::not_found("card", card_id))?;

        let scheduler = SpacedRepetitionScheduler::new(cfg.srs.clone());
        let updated = scheduler.review(&card, quality, Utc::now());
        self.with_timeout(timeout_ms, "cards", self.cards.save_card(&updated))
            .await?;

        debug!(
            user_id,
            card_id,
            quality = quality.value(),
            interval_days = updated.interval_days,
            "card reviewed"
        );
        Ok(updated)
    }

    /// Creates a card for a word the learner wants to study; due
    /// immediately.
    pub async fn add_card(
        &self,
        user_id: &str,
        word: &str,
        translation: &str,
        context: Option<&str>,
    ) -> Result<VocabularyCard, EngineError> {
        validate_user_id(user_id)?;
        if word.trim().is_empty() {
            return Err(EngineError::validation("word must not be empty"));
        }
        let card = VocabularyCard::new(user_id, word.trim(), translation, context);
        let timeout_ms = self.config.read().await.feed.upstream_timeout_ms;
        self.with_timeout(timeout_ms, "cards", self.cards.save_card(&card))
            .await?;
        Ok(card)
    }

    /// Due cards for a standalone review session, outside the feed. The
    /// caller's limit is clamped to the page-size ceiling rather than the
    /// in-feed due-card cap.
    pub async fn due_cards(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewCardItem>, EngineError> {
        validate_user_id(user_id)?;
        let limit = if limit == 0 {
            self.config.read().await.srs.due_card_cap
        } else {
            limit.min(MAX_PAGE_SIZE as usize)
        };
        let timeout_ms = self.config.read().await.feed.upstream_timeout_ms;
        let cards = self
            .with_timeout(
                timeout_ms,
                "cards",
                self.cards.load_due_cards(user_id, Utc::now(), limit),
            )
            .await?;
        Ok(cards.iter().map(review_item).collect())
    }

    pub async fn review_stats(&self, user_id: &str) -> Result<ReviewStats, EngineError> {
        validate_user_id(user_id)?;
        let cfg = self.config.read().await.clone();
        let cards = self
            .with_timeout(
                cfg.feed.upstream_timeout_ms,
                "cards",
                self.cards.load_all_cards(user_id),
            )
            .await?;
        let scheduler = SpacedRepetitionScheduler::new(cfg.srs.clone());
        Ok(scheduler.stats(&cards, Utc::now()))
    }

    /// Records an explicit engagement signal and folds it into the
    /// learner's bounded engagement history.
    pub async fn record_engagement(
        &self,
        user_id: &str,
        event: EngagementEvent,
    ) -> Result<(), EngineError> {
        validate_user_id(user_id)?;
        validate_content_id(&event.content_id)?;
        let cfg = self.config.read().await.clone();
        let timeout_ms = cfg.feed.upstream_timeout_ms;

        // Analytics is fire-and-forget: a down sink never fails the call.
        if let Err(err) = self
            .with_timeout(timeout_ms, "analytics", self.engagement.record_engagement(user_id, &event))
            .await
        {
            warn!(user_id, error = %err, "engagement sink unavailable, event not forwarded");
        }

        let mut profile = self.load_profile_cached(user_id, timeout_ms).await;
        upsert_history(&mut profile, event, cfg.feed.engagement_history_cap);
        profile.last_active_at = Some(Utc::now());
        if let Err(err) = self
            .with_timeout(timeout_ms, "profiles", self.profiles.save_profile(&profile))
            .await
        {
            warn!(user_id, error = %err, "engagement recorded but profile update failed");
        }
        self.profile_cache.put(profile).await;
        Ok(())
    }

    async fn load_profile_cached(&self, user_id: &str, timeout_ms: u64) -> LearnerProfile {
        if let Some(profile) = self.profile_cache.get(user_id).await {
            return profile;
        }
        let profile = match self
            .with_timeout(timeout_ms, "profiles", self.profiles.load_profile(user_id))
            .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) => LearnerProfile::new(user_id),
            Err(err) => {
                warn!(user_id, error = %err, "profile unavailable, using defaults");
                LearnerProfile::new(user_id)
            }
        };
        self.profile_cache.put(profile.clone()).await;
        profile
    }

    /// Marks the served items as shown. Persistence is fire-and-forget;
    /// the page has already been assembled and must not block on analytics.
    async fn record_page_shown(
        &self,
        user_id: &str,
        profile: &mut LearnerProfile,
        page_items: &[FeedItem],
        history_cap: usize,
    ) {
        let shown_ids: Vec<String> = page_items
            .iter()
            .filter(|item| !item.is_review())
            .map(|item| item.content_id().to_string())
            .collect();
        if shown_ids.is_empty() {
            return;
        }

        let now = Utc::now();
        for item in page_items {
            if let FeedItem::Content(scored) = item {
                push_history(
                    profile,
                    EngagementEvent::shown(&scored.item.id, &scored.item.content_type, now),
                    history_cap,
                );
            }
        }
        profile.last_active_at = Some(now);
        self.profile_cache.put(profile.clone()).await;

        let engagement = Arc::clone(&self.engagement);
        let profiles = Arc::clone(&self.profiles);
        let profile = profile.clone();
        let user = user_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = engagement.record_impressions(&user, &shown_ids, now).await {
                warn!(user_id = %user, error = %err, "impression recording failed");
            }
            if let Err(err) = profiles.save_profile(&profile).await {
                warn!(user_id = %user, error = %err, "profile history update failed");
            }
        });
    }

    async fn with_timeout<T>(
        &self,
        timeout_ms: u64,
        collaborator: &str,
        fut: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::upstream(collaborator, "timed out")),
        }
    }
}

/// Keeps items at or above the coverage cutoff. When that leaves fewer
/// than `min_items`, the threshold relaxes: the best-scoring below-cutoff
/// items top the list up, so a page is never blank while candidates exist.
fn apply_coverage_cutoff(
    ranked: Vec<ScoredItem>,
    cutoff: f64,
    min_items: usize,
) -> Vec<ScoredItem> {
    let (mut passing, below): (Vec<ScoredItem>, Vec<ScoredItem>) = ranked
        .into_iter()
        .partition(|scored| scored.score_breakdown.coverage >= cutoff);
    if passing.len() < min_items {
        let shortfall = min_items - passing.len();
        passing.extend(below.into_iter().take(shortfall));
    }
    passing
}

/// Engagement priors per content type: the learner's most-engaged types get
/// a fixed optimistic prior, everything else stays neutral.
fn engagement_priors(profile: &LearnerProfile, cfg: &EngineConfig) -> HashMap<String, f64> {
    let mut engaged_counts: HashMap<&str, usize> = HashMap::new();
    for event in &profile.engagement_history {
        if event.engaged {
            *engaged_counts.entry(event.content_type.as_str()).or_default() += 1;
        }
    }
    let mut ordered: Vec<(&str, usize)> = engaged_counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ordered
        .into_iter()
        .take(cfg.feed.preferred_type_count)
        .map(|(content_type, _)| (content_type.to_string(), cfg.feed.preferred_type_prior))
        .collect()
}

/// Engaging with an already-shown item updates that impression in place;
/// anything else appends.
fn upsert_history(profile: &mut LearnerProfile, event: EngagementEvent, cap: usize) {
    if event.engaged {
        if let Some(existing) = profile
            .engagement_history
            .iter_mut()
            .find(|e| e.content_id == event.content_id && !e.engaged)
        {
            existing.engaged = true;
            existing.engagement_type = event.engagement_type;
            existing.engaged_at = event.engaged_at.or_else(|| Some(Utc::now()));
            return;
        }
    }
    push_history(profile, event, cap);
}

fn push_history(profile: &mut LearnerProfile, event: EngagementEvent, cap: usize) {
    profile.engagement_history.push(event);
    if profile.engagement_history.len() > cap {
        let overflow = profile.engagement_history.len() - cap;
        profile.engagement_history.drain(..overflow);
    }
}

fn review_item(card: &VocabularyCard) -> ReviewCardItem {
    ReviewCardItem {
        card_id: card.id.clone(),
        word: card.word.clone(),
        translation: card.translation.clone(),
        context: card.context.clone(),
        next_review_at: card.next_review_at,
        interval_days: card.interval_days,
        priority: REVIEW_ITEM_PRIORITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentItem, ScoreBreakdown};
    use std::collections::HashSet;

    fn scored(id: &str, score: f64, coverage: f64) -> ScoredItem {
        ScoredItem {
            item: ContentItem {
                id: id.to_string(),
                content_type: "article".to_string(),
                title: id.to_string(),
                text: String::new(),
                tags: HashSet::new(),
                target_level: None,
                source: "rss".to_string(),
                category: "news".to_string(),
                published_at: None,
                unknown_words: None,
                coverage: Some(coverage),
            },
            score,
            score_breakdown: ScoreBreakdown {
                coverage,
                novelty_fit: 0.5,
                level_match: 0.5,
                interest_alignment: 0.5,
                recency: 0.5,
                srs_focus: 0.0,
                engagement_prediction: 0.5,
            },
        }
    }

    #[test]
    fn coverage_cutoff_drops_failures_when_enough_pass() {
        let ranked = vec![
            scored("a", 0.9, 0.95),
            scored("b", 0.8, 0.50),
            scored("c", 0.7, 0.90),
        ];
        let filtered = apply_coverage_cutoff(ranked, 0.85, 2);
        let ids: Vec<&str> = filtered.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn coverage_cutoff_relaxes_to_fill_a_short_page() {
        let ranked = vec![
            scored("a", 0.9, 0.95),
            scored("b", 0.8, 0.50),
            scored("c", 0.7, 0.40),
        ];
        let filtered = apply_coverage_cutoff(ranked, 0.85, 2);
        let ids: Vec<&str> = filtered.iter().map(|s| s.item.id.as_str()).collect();
        // One passing item; the best-scoring demoted item tops up to two.
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn nothing_passing_keeps_score_order() {
        let ranked = vec![scored("a", 0.9, 0.2), scored("b", 0.8, 0.3)];
        let filtered = apply_coverage_cutoff(ranked, 0.85, 20);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].item.id, "a");
    }

    #[test]
    fn priors_pick_most_engaged_types() {
        let cfg = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1");
        let now = Utc::now();
        for (content_type, engaged, count) in
            [("podcast", true, 4), ("article", true, 2), ("video", false, 9)]
        {
            for i in 0..count {
                let mut event =
                    EngagementEvent::shown(&format!("{content_type}-{i}"), content_type, now);
                event.engaged = engaged;
                profile.engagement_history.push(event);
            }
        }
        let priors = engagement_priors(&profile, &cfg);
        assert_eq!(priors.get("podcast"), Some(&cfg.feed.preferred_type_prior));
        assert_eq!(priors.get("article"), Some(&cfg.feed.preferred_type_prior));
        // Shown-only history carries no engagement signal.
        assert!(!priors.contains_key("video"));
    }

    #[test]
    fn engaging_updates_the_shown_event_in_place() {
        let mut profile = LearnerProfile::new("u1");
        let now = Utc::now();
        push_history(&mut profile, EngagementEvent::shown("c1", "article", now), 100);

        let mut engaged = EngagementEvent::shown("c1", "article", now);
        engaged.engaged = true;
        engaged.engagement_type = Some("completed".to_string());
        upsert_history(&mut profile, engaged, 100);

        assert_eq!(profile.engagement_history.len(), 1);
        assert!(profile.engagement_history[0].engaged);
        assert!(profile.engagement_history[0].engaged_at.is_some());
    }

    #[test]
    fn history_stays_bounded() {
        let mut profile = LearnerProfile::new("u1");
        let now = Utc::now();
        for i in 0..150 {
            push_history(
                &mut profile,
                EngagementEvent::shown(&format!("c{i}"), "article", now),
                100,
            );
        }
        assert_eq!(profile.engagement_history.len(), 100);
        assert_eq!(profile.engagement_history[0].content_id, "c50");
    }
}
