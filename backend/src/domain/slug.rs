//! Shared slug predicates and derivation for domain entities.
//!
//! Slugs are non-empty identifiers composed of lowercase ASCII letters and
//! digits separated by single hyphens.

/// Return `true` when `value` is a valid domain slug.
pub(crate) fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        })
}

/// Derive a slug from free text.
///
/// Latin accents are folded to their ASCII base letter, runs of any other
/// non-alphanumeric characters become a single hyphen, and characters with
/// no ASCII equivalent are dropped. The result may be empty.
pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;
    for ch in value.chars().flat_map(fold_char) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch.is_ascii_punctuation() {
            pending_hyphen = true;
        }
    }
    slug
}

/// Shorten `slug` to at most `max` bytes.
///
/// The cut lands on a hyphen when that keeps at least half of the limit;
/// otherwise the last segment is cut short.
pub(crate) fn truncate_slug(slug: &str, max: usize) -> &str {
    if slug.len() <= max {
        return slug;
    }
    let Some(head) = slug.get(..max) else {
        return slug;
    };
    if slug.get(max..=max) == Some("-") {
        return head;
    }
    match head.rfind('-') {
        Some(cut) if cut * 2 >= max => head.get(..cut).unwrap_or(head),
        _ => head,
    }
}

fn fold_char(ch: char) -> impl Iterator<Item = char> {
    let folded: &str = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'œ' | 'Œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        _ => "",
    };
    let passthrough = folded.is_empty().then_some(ch);
    folded.chars().chain(passthrough)
}
