//! The discovery loop itself.

use crate::errors::DiscoveryError;
use crate::types::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Accumulating discovery loop over one [`DiscoverySource`].
///
/// Merging is idempotent: given the same sequence of harvested sets, the
/// final accumulator and its order are deterministic regardless of how
/// duplicates are distributed across iterations.
pub struct DiscoveryLoop {
    config: DiscoveryConfig,
}

impl DiscoveryLoop {
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        if config.max_iterations == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if config.stagnation_limit == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "stagnation_limit must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Run the loop to termination and return the accumulator in
    /// first-seen order.
    pub async fn run<S: DiscoverySource>(&self, source: &mut S) -> Vec<DiscoveredItem> {
        let mut items: Vec<DiscoveredItem> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stagnant = 0u32;

        for iteration in 1..=self.config.max_iterations {
            let harvested = match source.harvest().await {
                Ok(harvested) => harvested,
                Err(err) => {
                    // A failed harvest is an iteration with zero new items,
                    // not a reason to abort the session.
                    warn!(iteration, error = %err, "harvest failed");
                    Vec::new()
                }
            };

            let before = items.len();
            for raw in harvested {
                // Later duplicates are dropped, not moved.
                if seen.insert(raw.key.clone()) {
                    items.push(DiscoveredItem {
                        key: raw.key,
                        payload: raw.payload,
                        first_seen_iteration: iteration,
                    });
                }
            }
            let grew = items.len() > before;

            if grew {
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            debug!(
                iteration,
                total = items.len(),
                new = items.len() - before,
                stagnant,
                "discovery iteration merged"
            );

            if stagnant >= self.config.stagnation_limit && iteration >= self.config.grace_period {
                info!(
                    iteration,
                    total = items.len(),
                    "discovery stopped: no growth for {} iterations",
                    stagnant
                );
                return items;
            }

            if iteration == self.config.max_iterations {
                break;
            }

            if let Err(err) = source.reveal_more().await {
                // A failed reveal leaves the viewport unchanged; the next
                // harvest repeats and stagnation will end the loop.
                warn!(iteration, error = %err, "reveal_more failed");
            }
        }

        info!(
            total = items.len(),
            max_iterations = self.config.max_iterations,
            "discovery stopped: iteration cap reached"
        );
        items
    }
}

/// One-shot convenience over [`DiscoveryLoop`].
pub async fn discover<S: DiscoverySource>(
    source: &mut S,
    config: DiscoveryConfig,
) -> Result<Vec<DiscoveredItem>, DiscoveryError> {
    Ok(DiscoveryLoop::new(config)?.run(source).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use handrail_driver::DriverError;

    /// Source replaying a fixed sequence of harvests; counts reveals.
    struct ScriptedSource {
        harvests: Vec<Result<Vec<RawItem>, DriverError>>,
        cursor: usize,
        harvest_calls: u32,
        reveal_calls: u32,
    }

    impl ScriptedSource {
        fn from_sets(sets: &[&[&str]]) -> Self {
            Self {
                harvests: sets
                    .iter()
                    .map(|set| Ok(set.iter().map(|s| RawItem::from_text(*s)).collect()))
                    .collect(),
                cursor: 0,
                harvest_calls: 0,
                reveal_calls: 0,
            }
        }
    }

    #[async_trait]
    impl DiscoverySource for ScriptedSource {
        async fn harvest(&mut self) -> Result<Vec<RawItem>, DriverError> {
            self.harvest_calls += 1;
            // Past the script, the screen keeps showing its last state.
            let index = self.cursor.min(self.harvests.len().saturating_sub(1));
            self.cursor += 1;
            match &self.harvests[index] {
                Ok(items) => Ok(items.clone()),
                Err(err) => Err(err.clone()),
            }
        }

        async fn reveal_more(&mut self) -> Result<(), DriverError> {
            self.reveal_calls += 1;
            Ok(())
        }
    }

    fn keys(items: &[DiscoveredItem]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    #[tokio::test]
    async fn overlapping_harvests_merge_in_first_seen_order() {
        let mut source = ScriptedSource::from_sets(&[&["A", "B"], &["B", "C"], &["C"]]);
        let items = discover(&mut source, DiscoveryConfig::new(10, 2))
            .await
            .unwrap();

        assert_eq!(keys(&items), vec!["A", "B", "C"]);
        assert_eq!(items[0].first_seen_iteration, 1);
        assert_eq!(items[1].first_seen_iteration, 1);
        assert_eq!(items[2].first_seen_iteration, 2);
    }

    #[tokio::test]
    async fn stagnation_terminates_after_grace() {
        // New items only in iterations 1-3; stagnation_limit=2, grace=2:
        // iterations 4 and 5 add nothing, so the loop stops at 5.
        let mut source = ScriptedSource::from_sets(&[&["A"], &["B"], &["C"], &["C"], &["C"]]);
        let config = DiscoveryConfig::new(100, 2).with_grace_period(2);

        let items = discover(&mut source, config).await.unwrap();

        assert_eq!(keys(&items), vec!["A", "B", "C"]);
        assert_eq!(source.harvest_calls, 5);
    }

    #[tokio::test]
    async fn grace_period_prevents_premature_termination() {
        // Zero growth in the first two iterations, content afterwards.
        let mut source =
            ScriptedSource::from_sets(&[&[], &[], &["A"], &["B"], &["B"], &["B"]]);
        let config = DiscoveryConfig::new(100, 2).with_grace_period(4);

        let items = discover(&mut source, config).await.unwrap();
        assert_eq!(keys(&items), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn iteration_cap_bounds_the_loop() {
        // Fresh item every iteration: only the cap can stop this.
        struct Endless {
            n: u32,
        }

        #[async_trait]
        impl DiscoverySource for Endless {
            async fn harvest(&mut self) -> Result<Vec<RawItem>, DriverError> {
                self.n += 1;
                Ok(vec![RawItem::from_text(format!("item-{}", self.n))])
            }

            async fn reveal_more(&mut self) -> Result<(), DriverError> {
                Ok(())
            }
        }

        let mut source = Endless { n: 0 };
        let items = discover(&mut source, DiscoveryConfig::new(7, 2))
            .await
            .unwrap();
        assert_eq!(items.len(), 7);
    }

    #[tokio::test]
    async fn harvest_error_counts_as_zero_new_items() {
        let mut source = ScriptedSource::from_sets(&[&["A"]]);
        source.harvests.insert(
            1,
            Err(DriverError::Io("accessibility tree unavailable".into())),
        );
        source.harvests.push(Ok(vec![RawItem::from_text("B")]));
        let config = DiscoveryConfig::new(100, 3).with_grace_period(2);

        let items = discover(&mut source, config).await.unwrap();
        assert_eq!(keys(&items), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn duplicate_keeps_first_payload_and_sighting() {
        let mut source = ScriptedSource {
            harvests: vec![
                Ok(vec![RawItem::new("row", serde_json::json!({"v": 1}))]),
                Ok(vec![RawItem::new("row", serde_json::json!({"v": 2}))]),
            ],
            cursor: 0,
            harvest_calls: 0,
            reveal_calls: 0,
        };

        let items = discover(&mut source, DiscoveryConfig::new(4, 2))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].payload, serde_json::json!({"v": 1}));
        assert_eq!(items[0].first_seen_iteration, 1);
    }

    #[tokio::test]
    async fn merge_is_deterministic_across_duplicate_distributions() {
        let mut left = ScriptedSource::from_sets(&[&["A", "B"], &["B", "C"], &["C"]]);
        let mut right = ScriptedSource::from_sets(&[&["A"], &["B", "C"], &["A", "B", "C"]]);
        let config = DiscoveryConfig::new(10, 2);

        let a = discover(&mut left, config).await.unwrap();
        let b = discover(&mut right, config).await.unwrap();
        assert_eq!(keys(&a), keys(&b));
    }

    #[tokio::test]
    async fn zero_max_iterations_is_rejected() {
        assert!(DiscoveryLoop::new(DiscoveryConfig::new(0, 2)).is_err());
    }

    #[tokio::test]
    async fn no_reveal_after_final_iteration() {
        let mut source = ScriptedSource::from_sets(&[&["A"], &["A"], &["A"]]);
        let config = DiscoveryConfig::new(100, 2).with_grace_period(2);

        discover(&mut source, config).await.unwrap();
        // Stops at iteration 3 (stagnant on 2 and 3); reveals happen after
        // iterations 1 and 2 only.
        assert_eq!(source.harvest_calls, 3);
        assert_eq!(source.reveal_calls, 2);
    }
}
