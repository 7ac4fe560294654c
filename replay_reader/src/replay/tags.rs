// Replay tags: reserved keys versus free-form tags, and search queries.

use std::collections::BTreeMap;

/// Tag keys that map to structured replay fields rather than free-form tags.
pub const RESERVED_TAG_KEYS: [&str; 18] = [
    "browser.name",
    "browser.version",
    "device.brand",
    "device.family",
    "device.model_id",
    "device.name",
    "platform",
    "releases",
    "replayType",
    "os.name",
    "os.version",
    "sdk.name",
    "sdk.version",
    "user.email",
    "user.username",
    // older payloads still send `name` instead of `username`
    "user.name",
    "user.id",
    "user.ip",
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_TAG_KEYS.contains(&key)
}

/// Tags with the reserved keys removed.
pub fn custom_tags(tags: &BTreeMap<String, Vec<String>>) -> BTreeMap<&str, &[String]> {
    tags.iter()
        .filter(|(key, _)| !is_reserved(key))
        .map(|(key, values)| (key.as_str(), values.as_slice()))
        .collect()
}

/// Search expression matching replays that carry `key = value`.
pub fn search_query(key: &str, value: &str) -> String {
    if is_reserved(key) {
        format!("{key}:\"{value}\"")
    } else {
        format!("tags[\"{key}\"]:\"{value}\"")
    }
}
