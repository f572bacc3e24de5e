// File: topics.rs
//
// The purpose of this file is the topic-selection helper: out of scope
// for the core per §1, but every role needs some way to pick a subset
// of topics, so it lives here as an ambient utility.

use rand::seq::SliceRandom;
use rand::thread_rng;

/// The full universe of topics a deployment may talk about.
pub const ALL_TOPICS: &[&str] = &[
    "T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8",
];

/// Chooses `count` distinct topics out of `ALL_TOPICS` without
/// replacement. `count` is clamped to the universe size.
pub fn choose_topics(count: usize) -> Vec<String> {
    let mut rng = thread_rng();
    let mut pool: Vec<&str> = ALL_TOPICS.to_vec();
    pool.shuffle(&mut rng);
    pool.into_iter()
        .take(count.min(ALL_TOPICS.len()))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn chooses_requested_count_without_duplicates() {
        let chosen = choose_topics(4);
        assert_eq!(chosen.len(), 4);
        let unique: HashSet<_> = chosen.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn clamps_to_the_topic_universe() {
        let chosen = choose_topics(100);
        assert_eq!(chosen.len(), ALL_TOPICS.len());
    }

    #[test]
    fn every_chosen_topic_is_in_the_universe() {
        let chosen = choose_topics(3);
        for t in &chosen {
            assert!(ALL_TOPICS.contains(&t.as_str()));
        }
    }
}
