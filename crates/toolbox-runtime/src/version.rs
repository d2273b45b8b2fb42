use std::cmp::Ordering;

/// Numeric components of a dotted version, ignoring any `-suffix` or `+build`.
///
/// `"4.9.4-rhel"` parses as `[4, 9, 4]`. Returns `None` when the leading
/// component is not numeric.
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    let core = version
        .trim()
        .trim_start_matches('v')
        .split(['-', '+', '~'])
        .next()?;
    let mut parts = Vec::new();
    for piece in core.split('.') {
        match piece.parse::<u64>() {
            Ok(n) => parts.push(n),
            Err(_) if !parts.is_empty() => break,
            Err(_) => return None,
        }
    }
    Some(parts)
}

/// Compare two versions component-wise; missing components count as zero.
pub fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

pub fn version_at_least(actual: &str, minimum: &str) -> bool {
    match (parse_version(actual), parse_version(minimum)) {
        (Some(a), Some(m)) => compare_versions(&a, &m) != Ordering::Less,
        _ => false,
    }
}
