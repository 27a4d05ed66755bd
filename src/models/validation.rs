use chrono::{DateTime, Datelike, Utc};
use url::{Host, Url};

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Current calendar year (UTC), the upper bound for founding years
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Check that a field's character count lies within `min..=max`
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!(
            "{} must be between {} and {} characters",
            field, min, max
        ));
    }
    Ok(())
}

/// Parse an absolute http(s) URL with a usable host
fn parse_web_url(field: &str, value: &str) -> Result<Url, String> {
    let invalid = || format!("{} must be an http(s) URL", field);

    let parsed = Url::parse(value).map_err(|e| {
        tracing::debug!("Rejected {} URL: {}", field, e);
        invalid()
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }

    match parsed.host() {
        Some(Host::Domain(domain)) if domain.split('.').all(|label| !label.is_empty()) => {}
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {}
        _ => return Err(invalid()),
    }

    Ok(parsed)
}

pub fn validate_url(field: &str, value: &str) -> Result<(), String> {
    parse_web_url(field, value).map(|_| ())
}

/// Social links must point at the network they claim to be
///
/// Accepts `host` itself and its subdomains (`www.`, `m.`).
pub fn validate_url_host(field: &str, value: &str, host: &str) -> Result<(), String> {
    let parsed = parse_web_url(field, value)?;
    let matches = parsed.host_str().is_some_and(|actual| {
        let actual = actual.to_ascii_lowercase();
        actual == host || actual.ends_with(&format!(".{}", host))
    });
    if !matches {
        return Err(format!("{} must be a link to {}", field, host));
    }
    Ok(())
}

/// Minimal email shape check: one `@`, non-empty local part, dotted domain
pub fn validate_email(value: &str) -> Result<(), String> {
    let invalid = || "Email must be a valid address".to_string();

    if value.len() > 254 || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.split_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() && !tld.ends_with('.') => Ok(()),
        _ => Err(invalid()),
    }
}

/// Letters, digits and @/./+/-/_ only, up to 150 characters
pub fn validate_username(value: &str) -> Result<(), String> {
    validate_length("Username", value, 1, 150)?;
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Username may contain only letters, digits and @/./+/-/_".to_string());
    }
    Ok(())
}

/// Map blank optional strings to `None`
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
