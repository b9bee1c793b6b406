//! Display strings for Kimi's enum-style constants.

/// Uppercases the first character and lowercases the rest.
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `FEATURE_CODING` -> `Feature Coding`.
pub fn scope_label(scope: &str) -> String {
    scope.split('_').map(title_case).collect::<Vec<_>>().join(" ")
}

/// `(5, TIME_UNIT_MINUTE)` -> `5-Minute Rate Limit`.
pub fn rate_limit_label(duration: i64, time_unit: &str) -> String {
    let unit = time_unit
        .strip_prefix("TIME_UNIT_")
        .unwrap_or(time_unit)
        .to_lowercase();
    let unit = unit.strip_suffix('s').unwrap_or(&unit);
    format!("{duration}-{} Rate Limit", title_case(unit))
}

/// `SUBSCRIPTION_STATUS_ACTIVE` -> `Active`; unknown values lose the prefix only.
pub fn subscription_status(status: &str) -> String {
    match status {
        "SUBSCRIPTION_STATUS_ACTIVE" => "Active".to_string(),
        "SUBSCRIPTION_STATUS_CANCELLED" => "Cancelled".to_string(),
        "SUBSCRIPTION_STATUS_EXPIRED" => "Expired".to_string(),
        other => other
            .strip_prefix("SUBSCRIPTION_STATUS_")
            .unwrap_or(other)
            .to_string(),
    }
}

/// `LEVEL_BASIC` -> `Basic`; unknown values lose the prefix only.
pub fn membership_level(level: &str) -> String {
    match level {
        "LEVEL_BASIC" => "Basic".to_string(),
        "LEVEL_STANDARD" => "Standard".to_string(),
        "LEVEL_PREMIUM" => "Premium".to_string(),
        other => other.strip_prefix("LEVEL_").unwrap_or(other).to_string(),
    }
}

/// `FEATURE_CODING` -> `Coding`.
pub fn feature_name(feature: &str) -> String {
    title_case(feature.strip_prefix("FEATURE_").unwrap_or(feature))
}
