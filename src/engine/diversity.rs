//! Feed-order shaping: breaks up runs of same-source content and spreads
//! due review cards evenly through the ranked list.

use std::collections::VecDeque;

use crate::engine::config::DiversityConfig;
use crate::types::{FeedItem, ReviewCardItem, ScoredItem};

#[derive(Debug, Clone)]
pub struct DiversityMixer {
    config: DiversityConfig,
}

impl DiversityMixer {
    pub fn new(config: DiversityConfig) -> Self {
        Self { config }
    }

    /// Single greedy pass over the ranked items. An item whose
    /// (source, category) key already appears `max_per_window` times in the
    /// sliding window of recent emissions is deferred; deferred items are
    /// appended afterwards in their original relative order, so no item is
    /// ever dropped.
    pub fn diversify(&self, items: Vec<ScoredItem>) -> Vec<ScoredItem> {
        if self.config.window_size == 0 || items.len() <= self.config.max_per_window {
            return items;
        }

        let mut emitted: Vec<ScoredItem> = Vec::with_capacity(items.len());
        let mut window: VecDeque<(String, String)> = VecDeque::new();
        let mut deferred: Vec<ScoredItem> = Vec::new();

        for item in items {
            let key = (item.item.source.clone(), item.item.category.clone());
            let repeats = window.iter().filter(|k| **k == key).count();
            if repeats >= self.config.max_per_window {
                deferred.push(item);
                continue;
            }
            window.push_back(key);
            if window.len() > self.config.window_size {
                window.pop_front();
            }
            emitted.push(item);
        }

        emitted.extend(deferred);
        emitted
    }

    /// Spreads `reviews` through `content` at a fixed interval of
    /// `max(1, content_len / review_len)`: review `i` lands at merged-list
    /// position `(i + 1) * interval`, clamped to the current list length,
    /// so three cards in a twelve-item feed sit at indices 4, 8 and 12.
    pub fn interleave_reviews(
        &self,
        content: Vec<ScoredItem>,
        reviews: Vec<ReviewCardItem>,
    ) -> Vec<FeedItem> {
        if reviews.is_empty() {
            return content.into_iter().map(FeedItem::Content).collect();
        }

        let interval = (content.len() / reviews.len()).max(1);
        let mut out: Vec<FeedItem> = content.into_iter().map(FeedItem::Content).collect();
        for (i, review) in reviews.into_iter().enumerate() {
            let position = ((i + 1) * interval).min(out.len());
            out.insert(position, FeedItem::Review(review));
        }
        out
    }
}

impl Default for DiversityMixer {
    fn default() -> Self {
        Self::new(DiversityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentItem, ScoreBreakdown};
    use chrono::Utc;
    use std::collections::HashSet;

    fn scored(id: &str, source: &str, category: &str) -> ScoredItem {
        ScoredItem {
            item: ContentItem {
                id: id.to_string(),
                content_type: "article".to_string(),
                title: id.to_string(),
                text: String::new(),
                tags: HashSet::new(),
                target_level: None,
                source: source.to_string(),
                category: category.to_string(),
                published_at: None,
                unknown_words: None,
                coverage: None,
            },
            score: 0.5,
            score_breakdown: ScoreBreakdown {
                coverage: 0.5,
                novelty_fit: 0.5,
                level_match: 0.5,
                interest_alignment: 0.5,
                recency: 0.5,
                srs_focus: 0.0,
                engagement_prediction: 0.5,
            },
        }
    }

    fn review(id: &str) -> ReviewCardItem {
        ReviewCardItem {
            card_id: id.to_string(),
            word: "gato".to_string(),
            translation: "cat".to_string(),
            context: None,
            next_review_at: Utc::now(),
            interval_days: 1,
            priority: crate::constants::REVIEW_ITEM_PRIORITY,
        }
    }

    #[test]
    fn defers_third_repeat_within_window() {
        let mixer = DiversityMixer::default();
        let items = vec![
            scored("a1", "rss", "news"),
            scored("a2", "rss", "news"),
            scored("a3", "rss", "news"),
            scored("b1", "podcast", "culture"),
        ];
        let out = mixer.diversify(items);
        let ids: Vec<&str> = out.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b1", "a3"]);
    }

    #[test]
    fn no_item_is_dropped() {
        let mixer = DiversityMixer::default();
        let items: Vec<ScoredItem> = (0..25)
            .map(|i| scored(&format!("i{i}"), "rss", if i % 2 == 0 { "news" } else { "sports" }))
            .collect();
        let out = mixer.diversify(items);
        assert_eq!(out.len(), 25);
        let unique: HashSet<&str> = out.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn homogeneous_input_defers_everything_past_the_limit() {
        let mixer = DiversityMixer::default();
        let items: Vec<ScoredItem> =
            (0..40).map(|i| scored(&format!("i{i}"), "rss", "news")).collect();
        let out = mixer.diversify(items);
        assert_eq!(out.len(), 40);
        // Two emissions fill the per-window allowance; the rest trail in
        // their original relative order.
        assert_eq!(out[0].item.id, "i0");
        assert_eq!(out[1].item.id, "i1");
        assert_eq!(out[2].item.id, "i2");
        assert_eq!(out[39].item.id, "i39");
    }

    #[test]
    fn interleaves_reviews_at_absolute_interval_positions() {
        let mixer = DiversityMixer::default();
        let content: Vec<ScoredItem> =
            (0..12).map(|i| scored(&format!("c{i}"), "rss", "news")).collect();
        let reviews = vec![review("r0"), review("r1"), review("r2")];
        let out = mixer.interleave_reviews(content, reviews);
        assert_eq!(out.len(), 15);
        let review_positions: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_review())
            .map(|(idx, _)| idx)
            .collect();
        // interval = floor(12 / 3) = 4.
        assert_eq!(review_positions, vec![4, 8, 12]);
    }

    #[test]
    fn more_reviews_than_content_still_emits_everything() {
        let mixer = DiversityMixer::default();
        let content = vec![scored("c0", "rss", "news")];
        let reviews = vec![review("r0"), review("r1"), review("r2")];
        let out = mixer.interleave_reviews(content, reviews);
        assert_eq!(out.len(), 4);
        assert_eq!(out.iter().filter(|i| i.is_review()).count(), 3);
    }

    #[test]
    fn empty_content_yields_reviews_only() {
        let mixer = DiversityMixer::default();
        let out = mixer.interleave_reviews(Vec::new(), vec![review("r0")]);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_review());
    }
}
