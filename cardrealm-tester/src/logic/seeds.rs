use anyhow::{Result, bail};
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;

/// Resolve a list of CLI seed arguments into canonical seeds.
///
/// Supports decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hexadecimal. Duplicates are dropped, keeping first-seen order.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let Some(seed) = parse_seed(token) else {
            bail!("Unrecognized seed token: {token}");
        };
        if seen.insert(seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Option<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(&hex.replace('_', ""), 16).ok();
    }
    if let Ok(value) = token.parse::<i64>() {
        return Some(value.unsigned_abs());
    }
    token.parse::<u64>().ok()
}

/// Seed for one iteration of a scenario.
#[must_use]
pub fn iteration_seed(seed: u64, iteration: usize) -> u64 {
    seed.wrapping_add(u64::try_from(iteration).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_decimal_negative_and_hex() {
        let raw = vec![
            "42".to_string(),
            "-7".to_string(),
            "0xC0_FFEE".to_string(),
            "18446744073709551615".to_string(),
        ];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert_eq!(seeds, vec![42, 7, 0x00C0_FFEE, u64::MAX]);
    }

    #[test]
    fn dedups_and_defaults() {
        let seeds = resolve_seed_inputs(&["5".to_string(), "5".to_string()]).unwrap();
        assert_eq!(seeds, vec![5]);
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&["banana".to_string()]).is_err());
    }

    #[test]
    fn iteration_seed_wraps() {
        assert_eq!(iteration_seed(u64::MAX, 1), 0);
        assert_eq!(iteration_seed(10, 3), 13);
    }
}
