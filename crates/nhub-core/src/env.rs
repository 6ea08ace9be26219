//! Environment variable utilities
//!
//! Used by `HubConfig::from_env()` to apply `NHUB_*` overrides on top of
//! library defaults.
//!
//! # Usage
//!
//! ```ignore
//! use nhub_core::env::{env_get, env_get_bool, env_get_u64};
//!
//! let chunk: usize = env_get("NHUB_RECV_CHUNK", 1024);
//! let blocking = env_get_bool("NHUB_BLOCKING", true);
//! let limit = env_get_u64("NHUB_KEY_LIMIT", 0xffff_ffff); // accepts 0x... too
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Unset variables and values that fail to parse both yield `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// "1", "true", "yes", "on" are true; "0", "false", "no", "off" are false
/// (case-insensitive). Anything else, including unset, returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Get environment variable as an unsigned integer, decimal or `0x` hex
#[inline]
pub fn env_get_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_u64(v.trim()))
        .unwrap_or(default)
}

fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// `Some(T)` if the variable is set and parses, `None` otherwise
#[inline]
fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; tests run in parallel.

    #[test]
    fn test_unset_returns_default() {
        let val: usize = env_get("__NHUB_TEST_UNSET__", 42);
        assert_eq!(val, 42);
        assert!(env_get_bool("__NHUB_TEST_UNSET__", true));
        assert_eq!(env_get_u64("__NHUB_TEST_UNSET__", 7), 7);
        assert!(env_get_opt::<usize>("__NHUB_TEST_UNSET__").is_none());
    }

    #[test]
    fn test_env_get_parses() {
        std::env::set_var("__NHUB_TEST_NUM__", " 123 ");
        let val: usize = env_get("__NHUB_TEST_NUM__", 0);
        assert_eq!(val, 123);
        std::env::remove_var("__NHUB_TEST_NUM__");
    }

    #[test]
    fn test_env_get_invalid_parse() {
        std::env::set_var("__NHUB_TEST_INVALID__", "not_a_number");
        let val: usize = env_get("__NHUB_TEST_INVALID__", 99);
        assert_eq!(val, 99);
        std::env::remove_var("__NHUB_TEST_INVALID__");
    }

    #[test]
    fn test_env_get_bool_variants() {
        std::env::set_var("__NHUB_TEST_BOOL__", "TRUE");
        assert!(env_get_bool("__NHUB_TEST_BOOL__", false));

        std::env::set_var("__NHUB_TEST_BOOL__", "on");
        assert!(env_get_bool("__NHUB_TEST_BOOL__", false));

        std::env::set_var("__NHUB_TEST_BOOL__", "0");
        assert!(!env_get_bool("__NHUB_TEST_BOOL__", true));

        std::env::set_var("__NHUB_TEST_BOOL__", "off");
        assert!(!env_get_bool("__NHUB_TEST_BOOL__", true));

        // Garbage keeps the default either way
        std::env::set_var("__NHUB_TEST_BOOL__", "garbage");
        assert!(env_get_bool("__NHUB_TEST_BOOL__", true));
        assert!(!env_get_bool("__NHUB_TEST_BOOL__", false));

        std::env::remove_var("__NHUB_TEST_BOOL__");
    }

    #[test]
    fn test_env_get_u64_hex() {
        std::env::set_var("__NHUB_TEST_HEX__", "0xfffffff0");
        assert_eq!(env_get_u64("__NHUB_TEST_HEX__", 0), 0xffff_fff0);

        std::env::set_var("__NHUB_TEST_HEX__", "4096");
        assert_eq!(env_get_u64("__NHUB_TEST_HEX__", 0), 4096);

        std::env::set_var("__NHUB_TEST_HEX__", "0xzz");
        assert_eq!(env_get_u64("__NHUB_TEST_HEX__", 5), 5);

        std::env::remove_var("__NHUB_TEST_HEX__");
    }
}
