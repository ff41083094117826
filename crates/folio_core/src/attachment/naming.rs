//! Stored attachment names: `<prefix>-<millis><random>.<ext>`.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const RANDOM_SUFFIX_MODULUS: u128 = 1_000_000_000;

/// Generates a collision-resistant stored name for an upload.
///
/// The extension is taken from `original_name` and lowercased; names without
/// an extension get none.
pub fn generate_stored_name(prefix: &str, original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());
    let random = Uuid::new_v4().as_u128() % RANDOM_SUFFIX_MODULUS;

    match extension_of(original_name) {
        Some(ext) => format!("{prefix}-{millis}{random}.{ext}"),
        None => format!("{prefix}-{millis}{random}"),
    }
}

/// Lowercased extension of a client-supplied file name.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{extension_of, generate_stored_name};
    use std::collections::HashSet;

    #[test]
    fn name_keeps_prefix_and_lowercased_extension() {
        let name = generate_stored_name("profile", "Me At Beach.PNG");
        assert!(name.starts_with("profile-"));
        assert!(name.ends_with(".png"));
        let stem = &name["profile-".len()..name.len() - ".png".len()];
        assert!(stem.chars().all(|c| c.is_ascii_digit()), "{name}");
    }

    #[test]
    fn names_are_unique_across_rapid_calls() {
        let names: HashSet<_> = (0..500)
            .map(|_| generate_stored_name("profile", "a.jpg"))
            .collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn extension_of_ignores_odd_suffixes() {
        assert_eq!(extension_of("model.STEP").as_deref(), Some("step"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("weird.p/ng"), None);
    }
}
