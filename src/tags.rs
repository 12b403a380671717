//! # Tag Budget Module
//!
//! YouTube rifiuta uno snippet i cui tag superano un budget cumulativo:
//! ogni tag conta la sua lunghezza in caratteri più un separatore.
//!
//! ## Algoritmo:
//! - Scorre i tag nell'ordine originale accumulando `len + 1`
//! - Si ferma al primo tag che farebbe superare il budget (`>` stretto)
//! - Nessun riordino, nessun troncamento parziale: il tag che sfora e tutti
//!   i successivi vengono scartati

/// Cost of one tag inside the budget
fn tag_cost(tag: &str) -> usize {
    tag.chars().count() + 1
}

/// Longest prefix of `tags` whose cumulative cost stays within `budget`
pub fn trim_tags<S: AsRef<str>>(tags: &[S], budget: usize) -> Vec<String> {
    let mut total = 0;
    let mut kept = Vec::new();

    for tag in tags {
        let tag = tag.as_ref();
        let cost = tag_cost(tag);
        if total + cost > budget {
            break;
        }
        total += cost;
        kept.push(tag.to_string());
    }

    kept
}

/// Cumulative cost of a tag list, as counted against the budget
pub fn tags_cost<S: AsRef<str>>(tags: &[S]) -> usize {
    tags.iter().map(|t| tag_cost(t.as_ref())).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let tags: Vec<String> = Vec::new();
        assert!(trim_tags(&tags, 500).is_empty());
    }

    #[test]
    fn test_single_oversized_tag() {
        let tags = vec!["x".repeat(600)];
        assert!(trim_tags(&tags, 500).is_empty());
    }

    #[test]
    fn test_budget_exactly_met_keeps_tag() {
        // 4 + 1 + 4 + 1 = 10
        let tags = ["abcd", "efgh", "ij"];
        assert_eq!(trim_tags(&tags, 10), vec!["abcd", "efgh"]);
        assert_eq!(trim_tags(&tags, 9), vec!["abcd"]);
    }

    #[test]
    fn test_stops_at_first_overflow() {
        // "longer" overflows; "b" would still fit but must not be picked
        let tags = ["a", "longer", "b"];
        assert_eq!(trim_tags(&tags, 5), vec!["a"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let tags = ["réseau", "ça"];
        assert_eq!(tags_cost(&tags), 7 + 3);
        assert_eq!(trim_tags(&tags, 10), vec!["réseau", "ça"]);
    }

    #[test]
    fn test_fortieth_tag_overflows() {
        let mut tags = vec!["ai".to_string(), "ml".to_string(), "robotics".to_string()];
        // 3 + 3 + 9 = 15, then 36 tags of cost 12 -> 447
        for i in 0..36 {
            tags.push(format!("tag-{:07}", i));
        }
        assert_eq!(tags_cost(&tags), 447);
        // 40th tag brings the total to 501
        tags.push("y".repeat(53));
        tags.push("z".to_string());
        assert_eq!(tags_cost(&tags[..40]), 501);

        let trimmed = trim_tags(&tags, 500);
        assert_eq!(trimmed.len(), 39);
        assert_eq!(trimmed[..], tags[..39]);
    }

    #[test]
    fn test_result_is_longest_valid_prefix() {
        let tags: Vec<String> = (0..200).map(|i| "t".repeat(i % 17 + 1)).collect();
        for budget in [0, 1, 2, 17, 100, 333, 500, 5000] {
            let trimmed = trim_tags(&tags, budget);
            assert!(tags_cost(&trimmed) <= budget);
            assert_eq!(trimmed[..], tags[..trimmed.len()]);
            if trimmed.len() < tags.len() {
                assert!(tags_cost(&tags[..trimmed.len() + 1]) > budget);
            }
        }
    }
}
