use std::path::PathBuf;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_MAX_RECORDS: usize = 100_000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

pub fn server_port() -> u16 {
    std::env::var("TERRITORY_SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Upper bound on the number of records accepted by one submission.
pub fn max_records() -> usize {
    std::env::var("TERRITORY_MAX_RECORDS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_RECORDS)
}

pub fn max_body_bytes() -> usize {
    std::env::var("TERRITORY_MAX_BODY_BYTES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_BODY_BYTES)
}

pub fn static_dir() -> PathBuf {
    std::env::var("TERRITORY_STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

/// JSON array of records loaded once at startup.
pub fn seed_file() -> Option<PathBuf> {
    std::env::var("TERRITORY_SEED_FILE")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "TERRITORY_SERVER_PORT",
                "TERRITORY_MAX_RECORDS",
                "TERRITORY_STATIC_DIR",
                "TERRITORY_SEED_FILE",
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(max_records(), DEFAULT_MAX_RECORDS);
                assert_eq!(static_dir(), PathBuf::from("client/dist"));
                assert_eq!(seed_file(), None);
            },
        );
    }

    #[test]
    fn valid_overrides_are_used() {
        temp_env::with_vars(
            [
                ("TERRITORY_SERVER_PORT", Some("8080")),
                ("TERRITORY_MAX_RECORDS", Some("25")),
                ("TERRITORY_STATIC_DIR", Some("/srv/map")),
                ("TERRITORY_SEED_FILE", Some(" seed.json ")),
            ],
            || {
                assert_eq!(server_port(), 8080);
                assert_eq!(max_records(), 25);
                assert_eq!(static_dir(), PathBuf::from("/srv/map"));
                assert_eq!(seed_file(), Some(PathBuf::from("seed.json")));
            },
        );
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("TERRITORY_SERVER_PORT", Some("0")),
                ("TERRITORY_MAX_RECORDS", Some("lots")),
                ("TERRITORY_MAX_BODY_BYTES", Some("-1")),
                ("TERRITORY_SEED_FILE", Some("   ")),
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(max_records(), DEFAULT_MAX_RECORDS);
                assert_eq!(max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
                assert_eq!(seed_file(), None);
            },
        );
    }
}
