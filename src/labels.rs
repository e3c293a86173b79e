//! Enum label derivation.
//!
//! Document labels are the enum constant names with their longest common
//! prefix stripped (`COLOR_MASK_RED` in a `COLOR_MASK_*` enum becomes `RED`).
//! When no prefix is shared the raw names are used as-is, and a constant that
//! would strip to nothing keeps its raw name.

/// Longest common prefix of all names; empty when nothing is shared.
pub fn common_prefix<'a>(names: &[&'a str]) -> &'a str {
    let Some(&first) = names.first() else {
        return "";
    };
    let mut prefix = first;
    for name in &names[1..] {
        let shared = prefix
            .bytes()
            .zip(name.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        prefix = &prefix[..shared];
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

/// Labels for the full constant-name set, in input order.
pub fn derive_labels(raw_names: &[&str]) -> Vec<String> {
    let prefix = common_prefix(raw_names);
    raw_names
        .iter()
        .map(|name| {
            let stripped = &name[prefix.len()..];
            if stripped.is_empty() {
                (*name).to_string()
            } else {
                stripped.to_string()
            }
        })
        .collect()
}
