use std::collections::HashSet;

/// Lexical overlap between two text spans, in `[0, 1]`.
///
/// Tokens are lowercase whitespace-delimited words. The score is the shared
/// token count divided by the *larger* set's cardinality — "how much of the
/// shorter text is echoed in the longer one". The denominator choice makes
/// the score asymmetric for differently-sized token sets; that is
/// intentional and callers rely on it.
///
/// An empty token set on either side scores 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let common = tokens_a.intersection(&tokens_b).count();

    common as f64 / tokens_a.len().max(tokens_b.len()) as f64
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
