//! In-memory collaborator backend. Backs the test suites and small
//! single-process deployments; everything lives in tokio-guarded maps.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::EngineError;
use crate::store::{CardStore, ContentSource, EngagementSink, ProfileStore};
use crate::types::{ContentItem, EngagementEvent, LearnerProfile, VocabularyCard};

/// A card reviewed successfully at least this many times counts as a known
/// word even without an explicit mark.
const KNOWN_WORD_REPETITIONS: u32 = 2;

#[derive(Default)]
pub struct InMemoryStore {
    content: RwLock<Vec<ContentItem>>,
    profiles: RwLock<HashMap<String, LearnerProfile>>,
    known_words: RwLock<HashMap<String, HashSet<String>>>,
    cards: RwLock<HashMap<String, Vec<VocabularyCard>>>,
    impressions: RwLock<HashMap<String, Vec<String>>>,
    engagements: RwLock<HashMap<String, Vec<EngagementEvent>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_content(&self, items: Vec<ContentItem>) {
        self.content.write().await.extend(items);
    }

    pub async fn insert_profile(&self, profile: LearnerProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
    }

    pub async fn mark_known(&self, user_id: &str, words: impl IntoIterator<Item = String>) {
        self.known_words
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .extend(words);
    }

    pub async fn insert_card(&self, card: VocabularyCard) {
        self.cards
            .write()
            .await
            .entry(card.user_id.clone())
            .or_default()
            .push(card);
    }

    pub async fn impressions_for(&self, user_id: &str) -> Vec<String> {
        self.impressions
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn engagements_for(&self, user_id: &str) -> Vec<EngagementEvent> {
        self.engagements
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContentSource for InMemoryStore {
    async fn fetch_candidates(
        &self,
        _user_id: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, EngineError> {
        let content = self.content.read().await;
        Ok(content.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn load_profile(&self, user_id: &str) -> Result<Option<LearnerProfile>, EngineError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn save_profile(&self, profile: &LearnerProfile) -> Result<(), EngineError> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    /// Explicit marks merged with words whose cards have graduated past the
    /// repetition threshold.
    async fn load_known_words(&self, user_id: &str) -> Result<HashSet<String>, EngineError> {
        let mut known = self
            .known_words
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        if let Some(cards) = self.cards.read().await.get(user_id) {
            known.extend(
                cards
                    .iter()
                    .filter(|card| card.repetitions >= KNOWN_WORD_REPETITIONS)
                    .map(|card| card.word.clone()),
            );
        }
        Ok(known)
    }
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn load_card(
        &self,
        user_id: &str,
        card_id: &str,
    ) -> Result<Option<VocabularyCard>, EngineError> {
        Ok(self
            .cards
            .read()
            .await
            .get(user_id)
            .and_then(|cards| cards.iter().find(|c| c.id == card_id))
            .cloned())
    }

    async fn save_card(&self, card: &VocabularyCard) -> Result<(), EngineError> {
        let mut cards = self.cards.write().await;
        let user_cards = cards.entry(card.user_id.clone()).or_default();
        match user_cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card.clone(),
            None => user_cards.push(card.clone()),
        }
        Ok(())
    }

    async fn load_due_cards(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<VocabularyCard>, EngineError> {
        let cards = self.cards.read().await;
        let mut due: Vec<VocabularyCard> = cards
            .get(user_id)
            .map(|cards| {
                cards
                    .iter()
                    .filter(|card| card.next_review_at <= now)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        due.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at));
        due.truncate(limit);
        Ok(due)
    }

    async fn load_all_cards(&self, user_id: &str) -> Result<Vec<VocabularyCard>, EngineError> {
        Ok(self.cards.read().await.get(user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl EngagementSink for InMemoryStore {
    async fn record_impressions(
        &self,
        user_id: &str,
        content_ids: &[String],
        _at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.impressions
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .extend_from_slice(content_ids);
        Ok(())
    }

    async fn record_engagement(
        &self,
        user_id: &str,
        event: &EngagementEvent,
    ) -> Result<(), EngineError> {
        self.engagements
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(event.clone());
        Ok(())
    }
}
