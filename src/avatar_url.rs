//! Avatar URL construction
//!
//! Pure functions that map a resolved avatar descriptor plus per-request
//! rendering hints onto the upstream CDN's URL scheme. Nothing in here holds
//! state; these are recomputed for every request because the hints vary per
//! request.

/// Size used when the client asks for nothing, or for something invalid.
pub const DEFAULT_SIZE: u64 = 4096;

/// Image extensions the CDN will actually serve.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpeg", "jpg", "webp", "gif"];

/// Hash prefix the upstream uses to mark animated avatars.
const ANIMATED_PREFIX: &str = "a_";

/// Number of default-avatar variants the CDN shards across.
const DEFAULT_AVATAR_SLOTS: u128 = 6;

/// Whether `id` looks like an upstream user identifier: a decimal string of
/// 17 to 21 digits.
pub fn is_valid_user_id(id: &str) -> bool {
    (17..=21).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit())
}

/// Normalize a client-requested size hint.
///
/// Accepted sizes are positive exact powers of two; anything else (absent,
/// non-numeric, zero, negative, 100, ...) falls back to [`DEFAULT_SIZE`].
pub fn normalize_size(requested: Option<&str>) -> u64 {
    match requested.and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(size) if size > 0 && size.is_power_of_two() => size,
        _ => DEFAULT_SIZE,
    }
}

/// Normalize a client-requested extension hint.
///
/// A requested extension outside the supported set (or absent) falls back to
/// `gif` for animated hashes and `png` otherwise.
pub fn normalize_extension(hash: Option<&str>, requested: Option<&str>) -> &'static str {
    if let Some(requested) = requested {
        let requested = requested.trim().to_ascii_lowercase();
        if let Some(ext) = SUPPORTED_EXTENSIONS.iter().find(|e| **e == requested) {
            return ext;
        }
    }

    match hash {
        Some(hash) if hash.starts_with(ANIMATED_PREFIX) => "gif",
        _ => "png",
    }
}

/// Build the CDN URL for a custom avatar hash.
pub fn custom_avatar_url(
    cdn_base: &str,
    user_id: &str,
    hash: &str,
    size_hint: Option<&str>,
    extension_hint: Option<&str>,
) -> String {
    format!(
        "{}/avatars/{}/{}.{}?size={}",
        cdn_base.trim_end_matches('/'),
        user_id,
        hash,
        normalize_extension(Some(hash), extension_hint),
        normalize_size(size_hint),
    )
}

/// Build the CDN URL for a user with no custom avatar.
///
/// The slot is `(id >> 22) % 6`, the upstream's documented sharding scheme
/// for default avatars. Identifiers can exceed 64 bits at 21 digits, so the
/// arithmetic runs in u128; an unparsable id lands in slot 0.
pub fn default_avatar_url(cdn_base: &str, user_id: &str) -> String {
    let slot = user_id
        .parse::<u128>()
        .map(|id| (id >> 22) % DEFAULT_AVATAR_SLOTS)
        .unwrap_or(0);

    format!("{}/embed/avatars/{}.png", cdn_base.trim_end_matches('/'), slot)
}
