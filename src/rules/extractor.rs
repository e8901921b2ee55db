//! Domain extraction from blocking rules.
//!
//! # Responsibilities
//! - Strip AdGuard anchors (`||`, `|`) and exception markers (`@@`)
//! - Cut modifiers, separators and paths (`^`, `$`, `/`, whitespace)
//! - Drop a trailing `:port`
//! - Reject anything that is not a resolvable hostname
//!
//! # Design Decisions
//! - Returns a borrowed slice when no wildcard has to be removed
//! - Cosmetic, regex and IP rules yield `None`; callers decide what that means
//! - Internationalized names must already be punycode (`xn--`); raw Unicode
//!   labels yield `None`

use std::borrow::Cow;
use std::net::IpAddr;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Derive the probe-able domain of a rule, if it has one.
pub fn extract_domain(rule: &str) -> Option<Cow<'_, str>> {
    let mut rest = rule.trim();
    loop {
        if let Some(stripped) = rest.strip_prefix("@@") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('|') {
            rest = stripped;
        } else {
            break;
        }
    }

    let end = rest
        .find(|c: char| matches!(c, '^' | '$' | '/') || c.is_whitespace())
        .unwrap_or(rest.len());
    let head = strip_port(&rest[..end]);

    let domain: Cow<'_, str> = if head.contains('*') {
        Cow::Owned(head.replace('*', ""))
    } else {
        Cow::Borrowed(head)
    };

    let trimmed = domain.trim_start_matches('.');
    if trimmed.len() != domain.len() {
        return finish(Cow::Owned(trimmed.to_string()));
    }
    finish(domain)
}

/// `example.com:8443` → `example.com`. Anything with more than one colon
/// (IPv6, `scheme:`) is left alone and fails the hostname check later.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !name.contains(':')
                && !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => host,
    }
}

fn finish(domain: Cow<'_, str>) -> Option<Cow<'_, str>> {
    if is_hostname(&domain) && domain.parse::<IpAddr>().is_err() {
        Some(domain)
    } else {
        None
    }
}

/// Hostname shape check: at least two labels of ASCII alphanumerics,
/// hyphens and underscores, no label starting or ending with a hyphen.
pub fn is_hostname(candidate: &str) -> bool {
    let candidate = candidate.strip_suffix('.').unwrap_or(candidate);
    if candidate.is_empty() || candidate.len() > MAX_DOMAIN_LEN || !candidate.contains('.') {
        return false;
    }

    candidate.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}
