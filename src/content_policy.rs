// Terms that block a job from starting, matched as case-insensitive substrings
const DENIED_TERMS: &[&str] = &["free", "win", "cash", "prize", "winner", "guaranteed"];

/// Return the first denied term found in `text`, if any
pub fn find_denied_term(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    DENIED_TERMS.iter().cloned().find(|term| lowered.contains(term))
}
