use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;

/// Locale-independent shortest round-trip rendering (`0.01`, `1`, `1000000`).
pub fn fmt_num(value: f64) -> String {
    format!("{value}")
}

pub fn join_hyphen<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn join_hyphen_f64(values: &[f64]) -> String {
    values.iter().map(|v| fmt_num(*v)).collect::<Vec<_>>().join("-")
}

/// Decimal rounding with ties going to the even neighbour.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

pub fn parse_f64_csv(input: &str, what: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        values.push(
            token
                .parse::<f64>()
                .with_context(|| format!("invalid {what} value: {token}"))?,
        );
    }
    if values.is_empty() {
        return Err(anyhow!("no values parsed from --{what}"));
    }
    Ok(values)
}

pub fn parse_u32_csv(input: &str, what: &str) -> Result<Vec<u32>> {
    let mut values = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        values.push(
            token
                .parse::<u32>()
                .with_context(|| format!("invalid {what} value: {token}"))?,
        );
    }
    if values.is_empty() {
        return Err(anyhow!("no values parsed from --{what}"));
    }
    Ok(values)
}

pub fn read_env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_zeros() {
        assert_eq!(fmt_num(0.01), "0.01");
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(0.0001), "0.0001");
        assert_eq!(fmt_num(1_000_000.0), "1000000");
    }

    #[test]
    fn rounding_matches_half_even() {
        assert_eq!(round_to(0.6, 2), 0.6);
        assert_eq!(round_to(0.6 / 3.0, 3), 0.2);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(1.0, 1), 1.0);
    }

    #[test]
    fn csv_lists_skip_blanks() {
        assert_eq!(parse_u32_csv("20, 50,,", "population").unwrap(), vec![20, 50]);
        assert!(parse_f64_csv(" , ", "bonus").is_err());
        assert!(parse_f64_csv("0.1,abc", "bonus").is_err());
    }

    #[test]
    fn hyphen_join_matches_description_format() {
        assert_eq!(join_hyphen_f64(&[0.0, 1.0]), "0-1");
        assert_eq!(join_hyphen(&[20u32, 100]), "20-100");
    }
}
