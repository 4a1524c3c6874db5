//! Value parsers shared by the environment loader.

use std::net::IpAddr;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Parse a TCP port, rejecting zero.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an integer in `1..=65535`.
pub fn parse_port(field: &'static str, value: &str) -> ConfigResult<u16> {
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|_| invalid(field, value, "not_a_port"))?;
    if port == 0 {
        return Err(invalid(field, value, "zero"));
    }
    Ok(port)
}

/// Parse an IP address to bind.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an IP address.
pub fn parse_bind_addr(field: &'static str, value: &str) -> ConfigResult<IpAddr> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| invalid(field, value, "not_an_ip_address"))
}

/// Parse a strictly positive `u32`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is zero or not an integer.
pub fn parse_positive_u32(field: &'static str, value: &str) -> ConfigResult<u32> {
    let parsed = value
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid(field, value, "not_an_integer"))?;
    if parsed == 0 {
        return Err(invalid(field, value, "zero"));
    }
    Ok(parsed)
}

/// Parse a strictly positive `u64`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is zero or not an integer.
pub fn parse_positive_u64(field: &'static str, value: &str) -> ConfigResult<u64> {
    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|_| invalid(field, value, "not_an_integer"))?;
    if parsed == 0 {
        return Err(invalid(field, value, "zero"));
    }
    Ok(parsed)
}

/// Validate an absolute http(s) origin and strip any trailing slash.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an http(s) URL.
pub fn parse_base_url(field: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed).map_err(|_| invalid(field, value, "not_a_url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(field, value, "unsupported_scheme"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Validate a path segment used to build provider URLs (project, region, model, cloud name).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value contains `/`, whitespace, or `?`.
pub fn parse_identifier(field: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed
        .chars()
        .any(|ch| ch == '/' || ch == '?' || ch == '#' || ch.is_whitespace())
    {
        return Err(invalid(field, value, "invalid_identifier"));
    }
    Ok(trimmed.to_string())
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        value: Some(value.to_string()),
        reason,
    }
}
