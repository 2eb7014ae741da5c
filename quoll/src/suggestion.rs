/// Closest registered symbol to a mistyped one, if it is close enough to
/// plausibly be a typo. Unit symbols are short and case-significant (`MPa`
/// is a million times `Pa`, `mm` is not `Mm`), so candidates are compared
/// case-sensitively and the allowed edit distance scales with the input
/// length. Ties go to the lexicographically smallest candidate, keeping
/// suggestions deterministic.
pub fn did_you_mean<'a>(
    candidates: impl Iterator<Item = &'a str>,
    input: &str,
) -> Option<String> {
    let max_distance = match input.len() {
        0..=2 => 1,
        3..=5 => 2,
        _ => 3,
    };

    candidates
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| (candidate, strsim::damerau_levenshtein(candidate, input)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by(|(a, dist_a), (b, dist_b)| dist_a.cmp(dist_b).then(a.cmp(b)))
        .map(|(candidate, _)| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> impl Iterator<Item = &'static str> {
        ["m", "mm", "km", "kg", "s", "N", "kN", "Pa", "kPa", "MPa"].into_iter()
    }

    #[test]
    fn close_symbols_are_suggested() {
        assert_eq!(did_you_mean(symbols(), "kPA"), Some("kPa".into()));
        assert_eq!(did_you_mean(symbols(), "kNm"), Some("kN".into()));
    }

    #[test]
    fn distant_inputs_get_no_suggestion() {
        assert_eq!(did_you_mean(symbols(), "metre"), None);
        assert_eq!(did_you_mean(symbols(), "furlong"), None);
    }

    #[test]
    fn ties_resolve_to_the_smallest_candidate() {
        assert_eq!(
            did_you_mean(["km", "mm"].into_iter(), "Km"),
            Some("km".into())
        );
    }
}
