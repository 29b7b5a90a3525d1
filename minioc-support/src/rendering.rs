//! Text rendering for container diagnostics.
//!
//! Type names coming out of [`std::any::type_name`] are fully qualified and
//! noisy (`alloc::sync::Arc<dyn my_app::realm::Realm>`). Error messages use
//! the helpers here to keep them readable.

/// Separator placed between links of a resolution chain.
pub const CHAIN_ARROW: &str = " → ";

/// Renders a resolution chain, one link per identity.
///
/// ```
/// use minioc_support::rendering::render_chain;
///
/// let chain = ["Handler", "Realm", "Locator", "Handler"];
/// assert_eq!(render_chain(&chain), "Handler → Realm → Locator → Handler");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut out = String::new();
    for (i, link) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(CHAIN_ARROW);
        }
        out.push_str(link.as_ref());
    }
    out
}

/// Drops module paths from a type name, keeping generics and `dyn`.
///
/// ```
/// use minioc_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::realm::LdapRealm"), "LdapRealm");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn my_app::realm::Realm>"),
///     "Arc<dyn Realm>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment_start = 0;
    let bytes = full_name.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                segment_start = i;
                continue;
            }
            b'<' | b'>' | b',' | b' ' | b'(' | b')' | b'[' | b']' | b'&' | b';' => {
                out.push_str(&full_name[segment_start..i]);
                out.push(bytes[i] as char);
                segment_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    out.push_str(&full_name[segment_start..]);
    out
}

/// Picks registered names that look like `requested`, best match first.
///
/// Matching is on shortened names, case-insensitively: containment scores
/// highest, then a shared prefix of at least three characters.
pub fn suggest_similar<'a>(
    requested: &str,
    available: impl IntoIterator<Item = &'a str>,
    max_suggestions: usize,
) -> Vec<String> {
    let wanted = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(usize, &str)> = available
        .into_iter()
        .filter(|name| *name != requested)
        .filter_map(|name| {
            let candidate = shorten_type_name(name).to_lowercase();
            if candidate.contains(&wanted) || wanted.contains(&candidate) {
                return Some((100, name));
            }
            let prefix = candidate
                .chars()
                .zip(wanted.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (prefix >= 3).then_some((prefix * 10, name))
        })
        .collect();

    // Stable on ties so output follows the caller's ordering.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}
