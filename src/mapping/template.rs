//! Advisory classification of secrets into store templates.

use serde::{Deserialize, Serialize};

/// Coarse template a secret fits when landed in a structured store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretCategory {
    WindowsAccount,
    UnixAccount,
    Database,
    WebPassword,
    ApiKey,
    Generic,
}

impl SecretCategory {
    /// Conventional base path for secrets of this category.
    pub fn base_path(self) -> &'static str {
        match self {
            Self::WindowsAccount => "secret/windows",
            Self::UnixAccount => "secret/linux",
            Self::Database => "secret/database",
            Self::WebPassword => "secret/web",
            Self::ApiKey => "secret/api",
            Self::Generic => "secret/migrated",
        }
    }
}

impl std::fmt::Display for SecretCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WindowsAccount => "windows_account",
            Self::UnixAccount => "unix_account",
            Self::Database => "database",
            Self::WebPassword => "web_password",
            Self::ApiKey => "api_key",
            Self::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// Name-substring rules checked in order, then payload-shape heuristics,
/// then [`SecretCategory::Generic`]. Purely advisory: callers may ignore
/// the recommendation, nothing downstream depends on it.
#[derive(Debug, Clone, Default)]
pub struct TemplateRecommender;

const NAME_RULES: &[(&str, SecretCategory)] = &[
    ("database", SecretCategory::Database),
    ("db", SecretCategory::Database),
    ("mysql", SecretCategory::Database),
    ("postgres", SecretCategory::Database),
    ("sql", SecretCategory::Database),
    ("linux", SecretCategory::UnixAccount),
    ("unix", SecretCategory::UnixAccount),
    ("ssh", SecretCategory::UnixAccount),
    ("windows", SecretCategory::WindowsAccount),
    ("ad", SecretCategory::WindowsAccount),
    ("domain", SecretCategory::WindowsAccount),
    ("api", SecretCategory::ApiKey),
    ("key", SecretCategory::ApiKey),
    ("token", SecretCategory::ApiKey),
    ("web", SecretCategory::WebPassword),
    ("http", SecretCategory::WebPassword),
];

impl TemplateRecommender {
    pub fn new() -> Self {
        Self
    }

    /// Recommend a category from the secret's name and field keys.
    pub fn recommend<'a, I>(&self, name: &str, field_keys: I) -> SecretCategory
    where
        I: IntoIterator<Item = &'a str>,
    {
        let name_lower = name.to_lowercase();
        for (pattern, category) in NAME_RULES {
            if name_lower.contains(pattern) {
                return *category;
            }
        }

        let keys: Vec<String> = field_keys
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        let has = |needle: &str| keys.iter().any(|k| k.contains(needle));

        if has("api_key") || has("apikey") || has("api-key") || has("token") {
            SecretCategory::ApiKey
        } else if has("connection_string") || has("database") || has("dbname") {
            SecretCategory::Database
        } else if has("private_key") || has("ssh") {
            SecretCategory::UnixAccount
        } else {
            SecretCategory::Generic
        }
    }

    /// Destination path for a migrated secret: category base path plus a
    /// slugified name (lowercase, spaces and backslashes to hyphens).
    pub fn recommended_path(&self, category: SecretCategory, name: &str) -> String {
        let slug = name.to_lowercase().replace([' ', '\\'], "-");
        format!("{}/{slug}", category.base_path())
    }
}
