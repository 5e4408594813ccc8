use std::{env, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

/// Reads and parses the environment variable `name`. Returns `None` if the variable is unset or blank, and
/// `Some(Err(..))` if it is set but cannot be parsed, so that callers can decide how loudly to complain.
pub fn env_parse<T: FromStr>(name: &str) -> Option<Result<T, T::Err>> {
    env::var(name).ok().filter(|s| !s.trim().is_empty()).map(|s| s.trim().parse::<T>())
}

/// Reads a non-blank string from the environment variable `name`.
pub fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
