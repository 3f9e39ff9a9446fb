//! "Did you mean" hints for name lookups.
//!
//! Column and struct-field lookups by name go through [`suggest`] so that a
//! typo like `prce` produces `Did you mean 'price'?` in the error.

/// Edit distance (insertions, deletions, substitutions) between two strings,
/// counted in chars.
fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    // Single rolling row; `diag` carries the previous row's left neighbour.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = (above + 1)
                .min(row[j] + 1)
                .min(diag + usize::from(ca != cb));
            diag = above;
        }
    }
    row[b.len()]
}

fn max_edits(query_len: usize) -> usize {
    match query_len {
        0..=3 => 1,
        4..=5 => 2,
        _ => 3,
    }
}

/// Returns the candidate closest to `query`, if it is close enough.
///
/// Comparison ignores ASCII case. A case-insensitive exact match wins
/// immediately; otherwise the smallest edit distance wins if it is within a
/// budget that grows with the query length.
///
/// # Examples
///
/// ```
/// use quiver_common::utils::strings::find_similar;
///
/// let columns = ["id", "price", "quantity"];
/// assert_eq!(find_similar("prce", &columns), Some("price"));
/// assert_eq!(find_similar("PRICE", &columns), Some("price"));
/// assert_eq!(find_similar("zzzzzz", &columns), None);
/// ```
pub fn find_similar<'a, S: AsRef<str>>(query: &str, candidates: &'a [S]) -> Option<&'a str> {
    let q: Vec<char> = query.to_lowercase().chars().collect();
    let mut best: Option<(&'a str, usize)> = None;

    for candidate in candidates {
        let name = candidate.as_ref();
        let c: Vec<char> = name.to_lowercase().chars().collect();
        if c == q {
            return Some(name);
        }
        let d = edit_distance(&q, &c);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((name, d));
        }
    }

    best.filter(|&(_, d)| d <= max_edits(q.len()))
        .map(|(name, _)| name)
}

/// Formats a single suggestion.
///
/// ```
/// use quiver_common::utils::strings::format_suggestion;
///
/// assert_eq!(format_suggestion("price"), "Did you mean 'price'?");
/// ```
pub fn format_suggestion(suggestion: &str) -> String {
    format!("Did you mean '{suggestion}'?")
}

/// Looks up a close match and formats it as a hint in one step.
pub fn suggest<S: AsRef<str>>(query: &str, candidates: &[S]) -> Option<String> {
    find_similar(query, candidates).map(format_suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        edit_distance(&a, &b)
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(dist("", ""), 0);
        assert_eq!(dist("", "abc"), 3);
        assert_eq!(dist("abc", ""), 3);
        assert_eq!(dist("kitten", "sitting"), 3);
        assert_eq!(dist("price", "prce"), 1);
        assert_eq!(dist("naïve", "naive"), 1);
    }

    #[test]
    fn test_find_similar() {
        let cols = ["id", "name", "created_at"];
        assert_eq!(find_similar("nmae", &cols), Some("name"));
        assert_eq!(find_similar("ID", &cols), Some("id"));
        assert_eq!(find_similar("created", &cols), Some("created_at"));
        assert_eq!(find_similar("xyz", &cols), None);

        let none: [&str; 0] = [];
        assert_eq!(find_similar("id", &none), None);
    }

    #[test]
    fn test_suggest() {
        let fields = vec!["key".to_string(), "value".to_string()];
        assert_eq!(
            suggest("vaule", &fields).as_deref(),
            Some("Did you mean 'value'?")
        );
        assert_eq!(suggest("completely_different", &fields), None);
    }
}
