use serde::Serialize;

use crate::models::{ContentKind, Snapshot};

use super::similarity::jaccard;

/// Default number of neighbors kept
pub const DEFAULT_NEIGHBOR_COUNT: usize = 10;

/// Another user with positive similarity to the target
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Neighbor {
    pub user_id: String,
    pub similarity: f64,
}

/// Ranks every other user by like-set similarity to `target_id` for `kind`
///
/// Users with similarity ≤ 0 are dropped and the result is truncated to `k`.
/// Ties keep roster order (the sort is stable).
pub fn top_neighbors(
    snapshot: &Snapshot,
    target_id: &str,
    kind: ContentKind,
    k: usize,
) -> Vec<Neighbor> {
    let target_likes = snapshot.like_set(target_id, kind);
    if target_likes.is_empty() {
        return Vec::new();
    }

    let mut neighbors: Vec<Neighbor> = snapshot
        .roster()
        .into_iter()
        .filter(|user_id| *user_id != target_id)
        .map(|user_id| Neighbor {
            user_id: user_id.to_string(),
            similarity: jaccard(&target_likes, &snapshot.like_set(user_id, kind)),
        })
        .filter(|neighbor| neighbor.similarity > 0.0)
        .collect();

    neighbors.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    neighbors.truncate(k);

    tracing::debug!(
        user_id = %target_id,
        kind = %kind,
        neighbor_count = neighbors.len(),
        "Selected neighbors"
    );

    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LikeEvent, User};

    fn snapshot(likes: &[(&str, &str)], users: &[&str]) -> Snapshot {
        Snapshot::new(
            Vec::new(),
            users.iter().map(|id| User::new(*id, "", "")).collect(),
            likes
                .iter()
                .map(|(user, item)| LikeEvent::like(*user, *item, ContentKind::Music))
                .collect(),
        )
    }

    #[test]
    fn test_identical_sets_are_neighbors_disjoint_are_not() {
        let snapshot = snapshot(
            &[("u1", "m1"), ("u1", "m2"), ("u2", "m1"), ("u2", "m2"), ("u3", "m3")],
            &["u1", "u2", "u3"],
        );

        let neighbors = top_neighbors(&snapshot, "u1", ContentKind::Music, 10);
        assert_eq!(
            neighbors,
            vec![Neighbor {
                user_id: "u2".to_string(),
                similarity: 1.0
            }]
        );
    }

    #[test]
    fn test_never_includes_target() {
        let snapshot = snapshot(&[("u1", "m1"), ("u2", "m1")], &["u1", "u2", "u1"]);
        let neighbors = top_neighbors(&snapshot, "u1", ContentKind::Music, 10);
        assert!(neighbors.iter().all(|n| n.user_id != "u1"));
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn test_sorted_descending_ties_keep_roster_order() {
        let snapshot = snapshot(
            &[
                ("t", "a"),
                ("t", "b"),
                ("low", "a"),
                ("low", "x"),
                ("low", "y"),
                ("tie2", "a"),
                ("tie1", "a"),
                ("high", "a"),
                ("high", "b"),
            ],
            &["t", "low", "tie2", "tie1", "high"],
        );

        let ids: Vec<String> = top_neighbors(&snapshot, "t", ContentKind::Music, 10)
            .into_iter()
            .map(|n| n.user_id)
            .collect();
        assert_eq!(ids, vec!["high", "tie2", "tie1", "low"]);
    }

    #[test]
    fn test_truncates_to_k() {
        let snapshot = snapshot(
            &[("t", "a"), ("u1", "a"), ("u2", "a"), ("u3", "a")],
            &["t", "u1", "u2", "u3"],
        );
        assert_eq!(top_neighbors(&snapshot, "t", ContentKind::Music, 2).len(), 2);
        assert!(top_neighbors(&snapshot, "t", ContentKind::Music, 0).is_empty());
    }

    #[test]
    fn test_empty_when_target_has_no_likes() {
        let snapshot = snapshot(&[("u1", "a")], &["t", "u1"]);
        assert!(top_neighbors(&snapshot, "t", ContentKind::Music, 10).is_empty());
        assert!(top_neighbors(&snapshot, "t", ContentKind::Film, 10).is_empty());
    }
}
