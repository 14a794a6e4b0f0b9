//! Runtime configuration from the environment (and `.env`, if present).

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pocket-cart.db";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// SQLite database holding the key-value blobs.
    pub database_url: String,
    /// Store the sample catalog when no catalog exists yet.
    pub seed_catalog: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { database_url: DEFAULT_DATABASE_URL.to_string(), seed_catalog: true }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.database_url),
            seed_catalog: lookup("POCKET_CART_SEED").map_or(defaults.seed_catalog, |v| parse_flag(&v)),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
