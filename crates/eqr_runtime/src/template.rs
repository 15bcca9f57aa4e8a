//! Exercise template text: placeholder substitution and question splitting.
//!
//! Substitution is plain substring replacement, labels first in payload
//! order and then variables in generator order.

use eqr_codec::Tag;
use indexmap::IndexMap;

/// Replaces the lowercase label placeholders (`plus`, `minus`, ...) with the
/// payload's display strings.
pub fn substitute_labels(text: &str, labels: &IndexMap<Tag, String>) -> String {
    labels
        .iter()
        .fold(text.to_string(), |acc, (kind, shown)| {
            acc.replace(kind.placeholder(), shown)
        })
}

/// Replaces every occurrence of each variable name with its value.
pub fn substitute_variables(text: &str, variables: &IndexMap<String, i64>) -> String {
    variables
        .iter()
        .fold(text.to_string(), |acc, (name, value)| {
            if name.is_empty() {
                acc
            } else {
                acc.replace(name.as_str(), &value.to_string())
            }
        })
}

/// Splits substituted text into an optional displayed question and the
/// expression whose value is the answer.
///
/// A leading `"<question>: "` becomes the question. If what remains is a
/// single `lhs = rhs`, only `lhs` is kept for evaluation and the question
/// reads `"<question>: <lhs> = ?"` (or `"<lhs> = ?"` with no prefix).
pub fn split_question(text: &str) -> (Option<String>, String) {
    match text.split_once(": ") {
        Some((question, rest)) => match single_equation_lhs(rest) {
            Some(lhs) => (Some(format!("{question}: {lhs} = ?")), lhs),
            None => (Some(question.to_string()), rest.to_string()),
        },
        None => match single_equation_lhs(text) {
            Some(lhs) => (Some(format!("{lhs} = ?")), lhs),
            None => (None, text.to_string()),
        },
    }
}

fn single_equation_lhs(s: &str) -> Option<String> {
    let mut parts = s.split('=');
    let lhs = parts.next()?;
    parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(lhs.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_then_variables() {
        let mut labels = IndexMap::new();
        labels.insert(Tag::Plus, "Add".to_string());
        let mut vars = IndexMap::new();
        vars.insert("a".to_string(), 3);
        vars.insert("b".to_string(), -2);

        let text = substitute_labels("plus: a + b", &labels);
        assert_eq!(text, "Add: a + b");
        assert_eq!(substitute_variables(&text, &vars), "Add: 3 + -2");
    }

    #[test]
    fn labels_are_replaced_in_payload_order() {
        // STAR first, so the `star` that MINUS introduces is left alone
        let mut labels = IndexMap::new();
        labels.insert(Tag::Star, "times".to_string());
        labels.insert(Tag::Minus, "star".to_string());
        assert_eq!(substitute_labels("minus: 3 - 1", &labels), "star: 3 - 1");

        let mut reversed = IndexMap::new();
        reversed.insert(Tag::Minus, "star".to_string());
        reversed.insert(Tag::Star, "times".to_string());
        assert_eq!(substitute_labels("minus: 3 - 1", &reversed), "times: 3 - 1");
    }

    #[test]
    fn variable_substitution_is_substring_based() {
        let mut vars = IndexMap::new();
        vars.insert("x".to_string(), 7);
        assert_eq!(substitute_variables("max + x", &vars), "ma7 + 7");
    }

    #[test]
    fn unlabelled_placeholders_stay() {
        assert_eq!(substitute_labels("minus 1", &IndexMap::new()), "minus 1");
    }

    #[test]
    fn question_prefix_with_equation_keeps_lhs() {
        let (q, expr) = split_question("Find: 3 + 4 = 7");
        assert_eq!(q.as_deref(), Some("Find: 3 + 4 = ?"));
        assert_eq!(expr, "3 + 4");
    }

    #[test]
    fn question_prefix_without_equation() {
        let (q, expr) = split_question("Compute: 6 * 2");
        assert_eq!(q.as_deref(), Some("Compute"));
        assert_eq!(expr, "6 * 2");
    }

    #[test]
    fn bare_equation_and_bare_expression() {
        assert_eq!(
            split_question("5 - 1 = 4"),
            (Some("5 - 1 = ?".to_string()), "5 - 1".to_string())
        );
        assert_eq!(split_question("5 - 1"), (None, "5 - 1".to_string()));
        // two '=' is left alone
        assert_eq!(split_question("1 = 1 = 1"), (None, "1 = 1 = 1".to_string()));
    }
}
