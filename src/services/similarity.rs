use std::collections::BTreeSet;

/// Jaccard index of two like-sets: `|A ∩ B| / |A ∪ B|`
///
/// Two empty sets score 0.0. No shared evidence is not the same as
/// identical taste.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_both_empty_is_zero() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_identical_non_empty_is_one() {
        let a = set(&["m1", "m2"]);
        assert_eq!(jaccard(&a, &a.clone()), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(jaccard(&set(&["m1", "m2"]), &set(&["m3"])), 0.0);
        assert_eq!(jaccard(&set(&["m1"]), &set(&[])), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        let a = set(&["a", "b", "c"]);
        let b = set(&["b", "c", "d"]);
        assert!((jaccard(&a, &b) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_commutative_and_bounded() {
        let samples = [
            set(&[]),
            set(&["x"]),
            set(&["x", "y"]),
            set(&["y", "z", "w"]),
            set(&["a", "b", "x", "y"]),
        ];
        for a in &samples {
            for b in &samples {
                let ab = jaccard(a, b);
                assert_eq!(ab, jaccard(b, a));
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }
}
