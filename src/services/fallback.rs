use rand::{seq::SliceRandom, RngCore};

use crate::models::{snapshot::LikeSet, Catalog, GenreSet};

use super::recommendations::ScoredItem;

/// Ranks unseen catalog items by how many genres they share with `favorites`
///
/// Zero-overlap items stay eligible and sort last, so the list only comes
/// back short when the catalog runs out of unseen items. Equal overlaps keep
/// catalog order.
pub fn rank_by_genre_overlap(
    catalog: &Catalog,
    favorites: &GenreSet,
    seen: &LikeSet,
    limit: usize,
) -> Vec<ScoredItem> {
    let mut ranked: Vec<ScoredItem> = catalog
        .items
        .iter()
        .filter(|item| !seen.contains(&item.id))
        .map(|item| ScoredItem {
            item: item.clone(),
            score: favorites.overlap(&item.genres) as f64,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

/// Picks up to `limit` unseen items uniformly at random, without replacement
pub fn random_sample(
    catalog: &Catalog,
    seen: &LikeSet,
    limit: usize,
    rng: &mut dyn RngCore,
) -> Vec<ScoredItem> {
    let unseen: Vec<_> = catalog
        .items
        .iter()
        .filter(|item| !seen.contains(&item.id))
        .collect();

    unseen
        .choose_multiple(rng, limit.min(unseen.len()))
        .map(|item| ScoredItem {
            item: (*item).clone(),
            score: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentKind, Item};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::BTreeSet;

    fn catalog() -> Catalog {
        Catalog::new(
            ContentKind::Film,
            vec![
                Item::new("A", "Alpha", "sci-fi"),
                Item::new("B", "Bravo", "drama"),
                Item::new("C", "Charlie", "sci-fi,drama"),
            ],
        )
    }

    fn ids(items: &[ScoredItem]) -> Vec<&str> {
        items.iter().map(|s| s.item.id.as_str()).collect()
    }

    #[test]
    fn test_overlap_ranks_matches_first_and_keeps_zero_overlap() {
        let ranked = rank_by_genre_overlap(
            &catalog(),
            &GenreSet::parse("sci-fi"),
            &BTreeSet::new(),
            10,
        );

        assert_eq!(ids(&ranked), vec!["A", "C", "B"]);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[1].score, 1.0);
        assert_eq!(ranked[2].score, 0.0);
    }

    #[test]
    fn test_overlap_excludes_seen_and_truncates() {
        let seen: LikeSet = ["A".to_string()].into_iter().collect();
        let ranked = rank_by_genre_overlap(&catalog(), &GenreSet::parse("drama"), &seen, 1);
        assert_eq!(ids(&ranked), vec!["B"]);
    }

    #[test]
    fn test_overlap_without_favorites_keeps_catalog_order() {
        let ranked = rank_by_genre_overlap(&catalog(), &GenreSet::default(), &BTreeSet::new(), 10);
        assert_eq!(ids(&ranked), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_random_sample_is_bounded_by_catalog() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = random_sample(&catalog(), &BTreeSet::new(), 10, &mut rng);
        assert_eq!(sample.len(), 3);

        let unique: BTreeSet<&str> = ids(&sample).into_iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_random_sample_respects_limit_and_seen() {
        let mut rng = StdRng::seed_from_u64(42);
        let seen: LikeSet = ["B".to_string()].into_iter().collect();
        let sample = random_sample(&catalog(), &seen, 1, &mut rng);
        assert_eq!(sample.len(), 1);
        assert_ne!(sample[0].item.id, "B");
    }

    #[test]
    fn test_random_sample_of_empty_catalog_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty = Catalog::empty(ContentKind::Book);
        assert!(random_sample(&empty, &BTreeSet::new(), 5, &mut rng).is_empty());
    }
}
