//! Deterministic field-name translation.
//!
//! Translation is a pure function of the rule table and the payload:
//!
//! 1. exact case-insensitive match against a rule pattern,
//! 2. otherwise the first rule (in configuration order) whose pattern is a
//!    substring of the lowercased key,
//! 3. otherwise the key is normalized into the target naming convention
//!    and reported in the skipped list.
//!
//! When two source keys land on the same destination the rule that appears
//! EARLIER in the table wins, regardless of payload iteration order. The
//! losing value is dropped and the resolution is logged, never failed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::EngineError;

/// Casing applied to keys no rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `api_key` becomes `Api Key`
    TitleCase,
    /// `API Key` becomes `api_key`
    SnakeCase,
    /// Keys pass through untouched
    Preserve,
}

impl NamingConvention {
    fn normalize(self, key: &str) -> String {
        match self {
            Self::TitleCase => key
                .replace(['_', '-'], " ")
                .split_whitespace()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
            Self::SnakeCase => key.to_lowercase().replace([' ', '-'], "_"),
            Self::Preserve => key.to_string(),
        }
    }
}

/// One translation rule. `pattern` is matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub pattern: String,
    pub destination: String,
}

impl MappingRule {
    pub fn new(pattern: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            destination: destination.into(),
        }
    }
}

/// Ordered rule table plus a fallback convention for unmatched keys.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    rules: Vec<MappingRule>,
    convention: NamingConvention,
}

impl FieldMapper {
    /// Mapper with an explicit rule table.
    pub fn new(rules: Vec<MappingRule>, convention: NamingConvention) -> Self {
        Self { rules, convention }
    }

    /// No rules, keys pass through untouched. Used when both stores share
    /// a naming convention.
    pub fn identity() -> Self {
        Self::new(Vec::new(), NamingConvention::Preserve)
    }

    /// Default table for translating snake_case keys into Title Case
    /// store fields (`password` → `Password`, `api_key` → `API Key`).
    pub fn title_case_defaults() -> Self {
        let rules = vec![
            MappingRule::new("password", "Password"),
            MappingRule::new("passwd", "Password"),
            MappingRule::new("secret", "Password"),
            MappingRule::new("pass", "Password"),
            MappingRule::new("username", "Username"),
            MappingRule::new("user", "Username"),
            MappingRule::new("login", "Username"),
            MappingRule::new("account", "Username"),
            MappingRule::new("hostname", "Machine"),
            MappingRule::new("host", "Machine"),
            MappingRule::new("server", "Server"),
            MappingRule::new("machine", "Machine"),
            MappingRule::new("ip", "Machine"),
            MappingRule::new("address", "Machine"),
            MappingRule::new("database", "Database"),
            MappingRule::new("dbname", "Database"),
            MappingRule::new("db", "Database"),
            MappingRule::new("url", "URL"),
            MappingRule::new("endpoint", "Endpoint URL"),
            MappingRule::new("uri", "URL"),
            MappingRule::new("api_key", "API Key"),
            MappingRule::new("apikey", "API Key"),
            MappingRule::new("api-key", "API Key"),
            MappingRule::new("api_secret", "API Secret"),
            MappingRule::new("client_id", "Client ID"),
            MappingRule::new("client_secret", "Client Secret"),
            MappingRule::new("private_key", "Private Key"),
            MappingRule::new("notes", "Notes"),
            MappingRule::new("description", "Notes"),
            MappingRule::new("comment", "Notes"),
            MappingRule::new("domain", "Domain"),
            MappingRule::new("port", "Port"),
        ];
        Self::new(rules, NamingConvention::TitleCase)
    }

    /// Reverse table: Title Case store fields back into snake_case keys.
    pub fn snake_case_defaults() -> Self {
        let rules = vec![
            MappingRule::new("Password", "password"),
            MappingRule::new("Username", "username"),
            MappingRule::new("Machine", "host"),
            MappingRule::new("Server", "server"),
            MappingRule::new("Database", "database"),
            MappingRule::new("Endpoint URL", "endpoint"),
            MappingRule::new("URL", "url"),
            MappingRule::new("API Key", "api_key"),
            MappingRule::new("API Secret", "api_secret"),
            MappingRule::new("Client ID", "client_id"),
            MappingRule::new("Client Secret", "client_secret"),
            MappingRule::new("Private Key", "private_key"),
            MappingRule::new("Notes", "notes"),
            MappingRule::new("Domain", "domain"),
            MappingRule::new("Port", "port"),
        ];
        Self::new(rules, NamingConvention::SnakeCase)
    }

    /// Translate a payload.
    ///
    /// Returns the mapped payload and the list of source keys no rule
    /// matched (they are still carried over, normalized). Pure: identical
    /// input always yields identical output.
    pub fn map_fields(
        &self,
        payload: &BTreeMap<String, String>,
    ) -> (BTreeMap<String, String>, Vec<String>) {
        let mut mapped: BTreeMap<String, String> = BTreeMap::new();
        // Rule index and source key that produced each destination;
        // passthrough keys rank after every rule so any rule-mapped value
        // displaces them.
        let mut winner: BTreeMap<String, (usize, String)> = BTreeMap::new();
        let mut skipped = Vec::new();

        for (key, value) in payload {
            let key_lower = key.to_lowercase();

            let hit = self
                .rules
                .iter()
                .position(|rule| rule.pattern == key_lower)
                .or_else(|| {
                    self.rules
                        .iter()
                        .position(|rule| key_lower.contains(rule.pattern.as_str()))
                });

            let (destination, rank) = match hit {
                Some(index) => (self.rules[index].destination.clone(), index),
                None => {
                    skipped.push(key.clone());
                    (self.convention.normalize(key), usize::MAX)
                }
            };

            match winner.get(&destination) {
                Some((existing_rank, existing_key)) if *existing_rank <= rank => {
                    let resolution = EngineError::MappingAmbiguous {
                        destination: destination.clone(),
                        kept: existing_key.clone(),
                        dropped: key.clone(),
                    };
                    warn!(resolution = %resolution, "field mapping collision resolved by rule order");
                }
                _ => {
                    if let Some((_, displaced_key)) = winner.get(&destination) {
                        let resolution = EngineError::MappingAmbiguous {
                            destination: destination.clone(),
                            kept: key.clone(),
                            dropped: displaced_key.clone(),
                        };
                        warn!(resolution = %resolution, "field mapping collision resolved by rule order");
                    }
                    mapped.insert(destination.clone(), value.clone());
                    winner.insert(destination, (rank, key.clone()));
                }
            }
        }

        (mapped, skipped)
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn exact_match_beats_substring() {
        let mapper = FieldMapper::title_case_defaults();
        let (mapped, skipped) = mapper.map_fields(&payload(&[("username", "admin")]));

        assert_eq!(mapped.get("Username").map(String::as_str), Some("admin"));
        assert!(skipped.is_empty());
    }

    #[test]
    fn substring_match_uses_first_rule_in_order() {
        let mapper = FieldMapper::title_case_defaults();
        // "admin_password" has no exact rule; the "password" rule matches
        // by substring before the shorter "pass" rule.
        let (mapped, skipped) = mapper.map_fields(&payload(&[("admin_password", "s3cret")]));

        assert_eq!(mapped.get("Password").map(String::as_str), Some("s3cret"));
        assert!(skipped.is_empty());
    }

    #[test]
    fn unmatched_keys_are_normalized_and_skipped() {
        let mapper = FieldMapper::title_case_defaults();
        let (mapped, skipped) = mapper.map_fields(&payload(&[("rotation_ttl", "30d")]));

        assert_eq!(mapped.get("Rotation Ttl").map(String::as_str), Some("30d"));
        assert_eq!(skipped, vec!["rotation_ttl".to_string()]);
    }

    #[test]
    fn collision_resolves_by_rule_order_not_payload_order() {
        // "password" (rule 0) and "secret" (rule 2) both target Password.
        // BTreeMap iterates "password" before "secret"; reverse the rule
        // table's preference by probing both orderings via key choice:
        // "aaa_secret" sorts before "password" yet must still lose.
        let mapper = FieldMapper::title_case_defaults();
        let (mapped, _) = mapper.map_fields(&payload(&[
            ("aaa_secret", "from-secret-rule"),
            ("password", "from-password-rule"),
        ]));

        assert_eq!(
            mapped.get("Password").map(String::as_str),
            Some("from-password-rule")
        );
    }

    #[test]
    fn mapping_is_pure() {
        let mapper = FieldMapper::title_case_defaults();
        let input = payload(&[("username", "svc"), ("password", "pw"), ("custom_field", "x")]);

        let first = mapper.map_fields(&input);
        let second = mapper.map_fields(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn snake_case_defaults_reverse_title_case() {
        let mapper = FieldMapper::snake_case_defaults();
        let (mapped, skipped) = mapper.map_fields(&payload(&[
            ("Password", "pw"),
            ("Machine", "db01"),
            ("Endpoint URL", "https://x"),
            ("Custom Field", "y"),
        ]));

        assert_eq!(mapped.get("password").map(String::as_str), Some("pw"));
        assert_eq!(mapped.get("host").map(String::as_str), Some("db01"));
        assert_eq!(mapped.get("endpoint").map(String::as_str), Some("https://x"));
        assert_eq!(mapped.get("custom_field").map(String::as_str), Some("y"));
        assert_eq!(skipped, vec!["Custom Field".to_string()]);
    }

    #[test]
    fn identity_mapper_passes_everything_through_as_skipped() {
        let mapper = FieldMapper::identity();
        let input = payload(&[("anything", "v")]);
        let (mapped, skipped) = mapper.map_fields(&input);

        assert_eq!(mapped, input);
        assert_eq!(skipped, vec!["anything".to_string()]);
    }

    #[test]
    fn title_case_normalization() {
        assert_eq!(NamingConvention::TitleCase.normalize("api_rate_limit"), "Api Rate Limit");
        assert_eq!(NamingConvention::SnakeCase.normalize("Endpoint URL"), "endpoint_url");
        assert_eq!(NamingConvention::Preserve.normalize("AsIs"), "AsIs");
    }
}
