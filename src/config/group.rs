//! Tab list group definitions.

use super::defaults::{
    default_format, default_header_footer_update_rate_ms, default_placeholder_update_rate_ms,
};
use super::types::Settings;
use crate::error::ConfigError;
use glob::{MatchOptions, Pattern};
use serde::Deserialize;

const SERVER_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Prefix and suffix templates applied to a member's nametag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NametagTemplate {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// A named set of backend servers sharing one tab list format.
///
/// Groups are immutable snapshots: a reload replaces every group wholesale and
/// nothing edits one in place. Identity is the name alone.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub name: String,
    /// Server name globs (`lobby-*`), matched case-insensitively.
    #[serde(default)]
    pub servers: Vec<String>,
    /// Header animation frames; the first is the active one.
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub footers: Vec<String>,
    /// Entry display name template.
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub nametag: NametagTemplate,
    #[serde(default)]
    pub sorting_placeholders: Vec<String>,
    /// Periodic header/footer refresh interval, 0 disables it.
    #[serde(default = "default_header_footer_update_rate_ms")]
    pub header_footer_update_rate_ms: u64,
    #[serde(default = "default_placeholder_update_rate_ms")]
    pub placeholder_update_rate_ms: u64,
    /// Allow nametag teams to collide with other groups' teams.
    #[serde(default)]
    pub collisions: bool,
    #[serde(skip)]
    patterns: Vec<Pattern>,
}

impl Group {
    /// Build a group from a name and server globs.
    pub fn new(name: impl Into<String>, servers: &[&str]) -> Result<Self, ConfigError> {
        let mut group = Self {
            name: name.into(),
            servers: servers.iter().map(|s| s.to_string()).collect(),
            headers: Vec::new(),
            footers: Vec::new(),
            format: default_format(),
            nametag: NametagTemplate::default(),
            sorting_placeholders: Vec::new(),
            header_footer_update_rate_ms: default_header_footer_update_rate_ms(),
            placeholder_update_rate_ms: default_placeholder_update_rate_ms(),
            collisions: false,
            patterns: Vec::new(),
        };
        group.compile()?;
        Ok(group)
    }

    pub fn with_header_footer(mut self, header: &str, footer: &str) -> Self {
        self.headers = vec![header.to_string()];
        self.footers = vec![footer.to_string()];
        self
    }

    /// Compile the server globs. Called once after deserialization.
    pub(crate) fn compile(&mut self) -> Result<(), ConfigError> {
        self.patterns = self
            .servers
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ConfigError::Pattern {
                    group: self.name.clone(),
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    /// Whether this group explicitly lists `server`.
    pub fn contains_server(&self, server: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(server, SERVER_MATCH))
    }

    /// Whether this is the configured fallback group.
    pub fn is_default(&self, settings: &Settings) -> bool {
        self.name == settings.fallback_group
    }

    /// Active header frame.
    pub fn header_template(&self) -> &str {
        self.headers.first().map(String::as_str).unwrap_or("")
    }

    /// Active footer frame.
    pub fn footer_template(&self) -> &str {
        self.footers.first().map(String::as_str).unwrap_or("")
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_globs_case_insensitively() {
        let group = Group::new("lobby", &["lobby-*", "Hub"]).unwrap();
        assert!(group.contains_server("lobby-1"));
        assert!(group.contains_server("LOBBY-eu"));
        assert!(group.contains_server("hub"));
        assert!(!group.contains_server("survival"));
    }

    #[test]
    fn bad_glob_is_reported_with_group() {
        let err = Group::new("broken", &["lobby-[*"]).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { ref group, .. } if group == "broken"));
    }

    #[test]
    fn identity_is_name_only() {
        let a = Group::new("lobby", &["a"]).unwrap();
        let b = Group::new("lobby", &["b"]).unwrap().with_header_footer("x", "y");
        assert_eq!(a, b);
        assert_ne!(a, Group::new("survival", &["a"]).unwrap());
    }

    #[test]
    fn empty_templates_render_as_empty() {
        let group = Group::new("lobby", &[]).unwrap();
        assert_eq!(group.header_template(), "");
        assert_eq!(group.footer_template(), "");
    }
}
