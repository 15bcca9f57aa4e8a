//! Tag selection helpers for exercise menus.

use eqr_codec::{Exercise, Solution, Tag};
use std::collections::BTreeSet;

/// Exercise filter for a tag selection.
///
/// A selection of exactly `{PLUS}` only accepts exercises whose tags are
/// exactly `{PLUS}`, so mixed-operator exercises are not offered as plain
/// addition. Any other selection accepts an exercise sharing at least one tag.
pub fn matches_selection(exercise: &Exercise, selected: &BTreeSet<Tag>) -> bool {
    if selected.len() == 1 && selected.contains(&Tag::Plus) {
        let own: BTreeSet<Tag> = exercise.tags.iter().copied().collect();
        own.len() == 1 && own.contains(&Tag::Plus)
    } else {
        matches_any(exercise, selected)
    }
}

/// Any-overlap filter.
pub fn matches_any(exercise: &Exercise, selected: &BTreeSet<Tag>) -> bool {
    exercise.tags.iter().any(|t| selected.contains(t))
}

/// Tags offered for practice: every solution tag plus PLUS and MINUS, and
/// MORE_OPERANDS once more than two categories are present. Sorted by name.
pub fn available_tags(solutions: &[Solution]) -> Vec<Tag> {
    let mut all: BTreeSet<Tag> = solutions
        .iter()
        .flat_map(|s| s.tags.iter().copied())
        .collect();
    all.insert(Tag::Plus);
    all.insert(Tag::Minus);
    if all.len() > 2 {
        all.insert(Tag::MoreOperands);
    }
    let mut out: Vec<Tag> = all.into_iter().collect();
    out.sort_by_key(|t| t.as_str());
    out
}

/// Single category to practise after studying a solution with these tags.
pub fn primary_tag(tags: &[Tag]) -> Option<Tag> {
    let operators = [Tag::Plus, Tag::Minus, Tag::Star]
        .iter()
        .filter(|t| tags.contains(t))
        .count();
    if operators >= 2 || tags.contains(&Tag::MoreOperands) {
        return Some(Tag::MoreOperands);
    }
    [Tag::Star, Tag::Minus, Tag::Plus]
        .into_iter()
        .find(|t| tags.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(tags: &[Tag]) -> Exercise {
        Exercise {
            expression: "1".into(),
            tags: tags.to_vec(),
        }
    }

    fn sel(tags: &[Tag]) -> BTreeSet<Tag> {
        tags.iter().copied().collect()
    }

    fn sol(tags: &[Tag]) -> Solution {
        Solution {
            question: String::new(),
            steps: String::new(),
            tags: tags.to_vec(),
        }
    }

    #[test]
    fn plus_alone_is_exact() {
        let plus = sel(&[Tag::Plus]);
        assert!(matches_selection(&ex(&[Tag::Plus]), &plus));
        assert!(matches_selection(&ex(&[Tag::Plus, Tag::Plus]), &plus));
        assert!(!matches_selection(&ex(&[Tag::Plus, Tag::Star]), &plus));
        assert!(!matches_selection(&ex(&[]), &plus));
    }

    #[test]
    fn other_selections_overlap() {
        let minus = sel(&[Tag::Minus]);
        assert!(matches_selection(&ex(&[Tag::Minus, Tag::Star]), &minus));
        assert!(!matches_selection(&ex(&[Tag::Plus]), &minus));
        // any-overlap even for PLUS when it is not alone
        assert!(matches_any(&ex(&[Tag::Plus, Tag::Star]), &sel(&[Tag::Plus])));
    }

    #[test]
    fn available_tags_always_offer_plus_and_minus() {
        assert_eq!(available_tags(&[]), vec![Tag::Minus, Tag::Plus]);
        assert_eq!(
            available_tags(&[sol(&[Tag::Star])]),
            vec![Tag::Minus, Tag::MoreOperands, Tag::Plus, Tag::Star]
        );
        assert_eq!(
            available_tags(&[sol(&[Tag::Plus]), sol(&[Tag::Minus])]),
            vec![Tag::Minus, Tag::Plus]
        );
    }

    #[test]
    fn primary_tag_priorities() {
        assert_eq!(primary_tag(&[Tag::Plus, Tag::Star]), Some(Tag::MoreOperands));
        assert_eq!(primary_tag(&[Tag::MoreOperands]), Some(Tag::MoreOperands));
        assert_eq!(primary_tag(&[Tag::Star]), Some(Tag::Star));
        assert_eq!(primary_tag(&[Tag::Minus, Tag::Minus]), Some(Tag::Minus));
        assert_eq!(primary_tag(&[Tag::Plus]), Some(Tag::Plus));
        assert_eq!(primary_tag(&[]), None);
    }
}
