use anyhow::{Context, Result, bail};
use chrono::Utc;

/// Resolve CLI seed tokens into numeric seeds.
///
/// Supports signed or unsigned integers, `0x` hex literals and the keyword
/// `now`, which uses the current Unix time in milliseconds. Duplicates are
/// dropped while keeping the first occurrence; an empty list yields `1337`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("now") {
            Utc::now().timestamp_millis().unsigned_abs()
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {token}"))?
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(1337);
    }

    Ok(seeds)
}
