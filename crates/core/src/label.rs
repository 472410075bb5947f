//! Bazel labels

use crate::error::{Error, Result};
use crate::paths;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A Bazel target address such as `@repo//pkg/path:name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Label {
    /// External repository name, empty for the main repository
    pub repo: String,
    /// Package path relative to the repository root
    pub pkg: String,
    /// Target name within the package
    pub name: String,
    /// Spelled relative to the current package (`:name`)
    pub relative: bool,
}

impl Label {
    pub fn new(repo: impl Into<String>, pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            pkg: pkg.into(),
            name: name.into(),
            relative: false,
        }
    }

    /// Parse a label string. Accepts `@repo//pkg:name`, `//pkg:name`, `//pkg`
    /// (name defaults to the last package segment) and `:name`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidLabel(s.to_string());

        let s = s.trim();
        if s.is_empty() {
            return Err(invalid());
        }

        if let Some(name) = s.strip_prefix(':') {
            if name.is_empty() || name.contains(':') {
                return Err(invalid());
            }
            return Ok(Self {
                name: name.to_string(),
                relative: true,
                ..Default::default()
            });
        }

        let (repo, rest) = if let Some(stripped) = s.strip_prefix('@') {
            // `@@canonical` repositories keep a single leading marker
            let stripped = stripped.strip_prefix('@').unwrap_or(stripped);
            match stripped.find("//") {
                Some(i) => (&stripped[..i], &stripped[i..]),
                None => (stripped, "//"),
            }
        } else {
            ("", s)
        };

        let rest = rest.strip_prefix("//").ok_or_else(invalid)?;

        let (pkg, name) = match rest.split_once(':') {
            Some((pkg, name)) => (pkg, name.to_string()),
            None if !rest.is_empty() => (rest, paths::base(rest).to_string()),
            None if !repo.is_empty() => (rest, repo.to_string()),
            None => return Err(invalid()),
        };

        if name.is_empty() || name.contains(':') || pkg.starts_with('/') || pkg.ends_with('/') {
            return Err(invalid());
        }

        Ok(Self::new(repo, pkg, name))
    }

    /// The label as seen from within `repo`/`pkg`: labels in the same package
    /// become relative (`:name`), labels of the same repo drop the repo name.
    pub fn rel(&self, repo: &str, pkg: &str) -> Label {
        if self.relative {
            return self.clone();
        }

        if self.repo == repo && self.pkg == pkg {
            return Label {
                name: self.name.clone(),
                relative: true,
                ..Default::default()
            };
        }

        if self.repo == repo {
            return Label::new("", self.pkg.clone(), self.name.clone());
        }

        self.clone()
    }

    /// Resolve a relative label against the package it was written in.
    pub fn abs(&self, repo: &str, pkg: &str) -> Label {
        if !self.relative {
            return self.clone();
        }
        Label::new(repo, pkg, self.name.clone())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative {
            return write!(f, ":{}", self.name);
        }

        if !self.repo.is_empty() {
            write!(f, "@{}", self.repo)?;
        }

        if !self.pkg.is_empty() && paths::base(&self.pkg) == self.name {
            write!(f, "//{}", self.pkg)
        } else {
            write!(f, "//{}:{}", self.pkg, self.name)
        }
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Label::parse(s)
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Label::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// An ordered, duplicate-free set of dependency labels for one rule.
///
/// The rule's own label is never added, so a target can not depend on itself.
#[derive(Debug, Clone)]
pub struct LabelSet {
    from: Label,
    labels: BTreeSet<Label>,
}

impl LabelSet {
    pub fn new(from: Label) -> Self {
        Self {
            from,
            labels: BTreeSet::new(),
        }
    }

    /// Add an absolute label. Returns false for self references and duplicates.
    pub fn add(&mut self, label: Label) -> bool {
        let label = label.abs(&self.from.repo, &self.from.pkg);
        if label == self.from {
            return false;
        }
        self.labels.insert(label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.labels.contains(&label.abs(&self.from.repo, &self.from.pkg))
    }

    /// The labels spelled relative to the owning rule's package.
    pub fn labels(&self) -> Vec<Label> {
        self.labels
            .iter()
            .map(|l| l.rel(&self.from.repo, &self.from.pkg))
            .collect()
    }
}

impl Extend<Label> for LabelSet {
    fn extend<I: IntoIterator<Item = Label>>(&mut self, iter: I) {
        for label in iter {
            self.add(label);
        }
    }
}
