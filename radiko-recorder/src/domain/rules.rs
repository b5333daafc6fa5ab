//! Recording rules and rule file loading.
//!
//! A [`Rule`] pairs a set of stations with a set of title patterns. A program
//! matches a rule when it airs on one of the stations and any pattern is found
//! somewhere in its title. A [`RuleSet`] matches when any member rule does.
//!
//! Rule files are YAML sequences:
//!
//! ```yaml
//! - stations: [TBS, QRR]
//!   title_patterns: ["深夜の馬鹿力", "^オードリー"]
//! ```

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::BitOr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use super::program::Program;
use crate::utils::fs;
use crate::{Error, Result};

/// Upper bound for a compiled title pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A compiled title pattern, compared by its source text.
#[derive(Debug, Clone)]
pub struct TitlePattern(Regex);

impl TitlePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map(Self)
            .map_err(|e| Error::validation(format!("Invalid title pattern '{}': {}", pattern, e)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Substring search, not a full match.
    pub fn is_found_in(&self, title: &str) -> bool {
        self.0.is_match(title)
    }
}

impl FromStr for TitlePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for TitlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for TitlePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TitlePattern {}

impl Hash for TitlePattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Ord for TitlePattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for TitlePattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for TitlePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TitlePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Self::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// Stations plus title patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rule {
    pub stations: BTreeSet<String>,
    pub title_patterns: BTreeSet<TitlePattern>,
}

impl Rule {
    pub fn new<S, P>(stations: S, title_patterns: P) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Ok(Self {
            stations: stations.into_iter().map(Into::into).collect(),
            title_patterns: title_patterns
                .into_iter()
                .map(|p| TitlePattern::new(p.as_ref()))
                .collect::<Result<_>>()?,
        })
    }

    pub fn matches(&self, station_id: &str, program: &Program) -> bool {
        self.stations.contains(station_id)
            && self
                .title_patterns
                .iter()
                .any(|p| p.is_found_in(&program.title))
    }
}

/// Union-combinable set of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(BTreeSet<Rule>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }

    pub fn insert(&mut self, rule: Rule) -> bool {
        self.0.insert(rule)
    }

    /// Whether any rule accepts the program on the given station.
    pub fn matches(&self, station_id: &str, program: &Program) -> bool {
        self.0.iter().any(|rule| rule.matches(station_id, program))
    }

    pub fn union(mut self, other: RuleSet) -> RuleSet {
        self.0.extend(other.0);
        self
    }

    /// Parse a YAML rule document. An empty document yields an empty set.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_yml::from_str(source)?)
    }

    /// Load a rule file, or every `.yaml`/`.yml` file of a directory.
    pub async fn from_yaml_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| fs::io_error("reading rules", path, e))?;

        if metadata.is_dir() {
            let files = rule_files_in(path).await?;
            return Self::from_yaml_paths(&files).await;
        }

        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| fs::io_error("reading rules", path, e))?;
        let rules = Self::from_yaml_str(&source)?;
        debug!("Loaded {} rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Load several rule sources and merge them by union.
    pub async fn from_yaml_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut merged = Self::new();
        for path in paths {
            let rules = Box::pin(Self::from_yaml_path(path.as_ref())).await?;
            merged = merged | rules;
        }
        Ok(merged)
    }
}

impl BitOr for RuleSet {
    type Output = RuleSet;

    fn bitor(self, rhs: RuleSet) -> RuleSet {
        self.union(rhs)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

async fn rule_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| fs::io_error("listing rules", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| fs::io_error("listing rules", dir, e))?
    {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
