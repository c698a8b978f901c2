/// Lowercased, punctuation-free, single-spaced form used for duplicate detection.
pub(crate) fn normalize_text(value: &str) -> String {
    let cleaned: String = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub(crate) fn normalize_ref(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Address, city, and price identify a listing that carries no external reference.
pub(crate) fn fingerprint(address: &str, city: &str, price: u64) -> Option<String> {
    let address = normalize_text(address);
    if address.is_empty() {
        return None;
    }
    Some(format!("{address}|{}|{price}", normalize_text(city)))
}
