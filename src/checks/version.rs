//! Version-string parsing for the runtimes and distributions the battery
//! inspects. None of these follow semver strictly.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static LEGACY_JAVA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^1\.(\d+)(?:\.(\d+))?(?:_(\d+))?").expect("static regex is valid")
});
static MODERN_JAVA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("static regex is valid")
});
static JAVA_VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version "([^"]+)""#).expect("static regex is valid"));

fn capture_u64(caps: &regex::Captures<'_>, index: usize) -> u64 {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// A JVM version normalized across the `1.8.0_171` and `11.0.2` schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JavaVersion {
    pub feature: u64,
    pub interim: u64,
    pub update: u64,
}

impl JavaVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(caps) = LEGACY_JAVA.captures(raw) {
            return Some(Self {
                feature: capture_u64(&caps, 1),
                interim: capture_u64(&caps, 2),
                update: capture_u64(&caps, 3),
            });
        }
        MODERN_JAVA.captures(raw).map(|caps| Self {
            feature: capture_u64(&caps, 1),
            interim: capture_u64(&caps, 2),
            update: capture_u64(&caps, 3),
        })
    }

    /// Extract the quoted version from `java -version` output.
    pub fn from_version_output(output: &str) -> Option<(Self, String)> {
        let raw = JAVA_VERSION_LINE.captures(output)?.get(1)?.as_str().to_string();
        Self::parse(&raw).map(|version| (version, raw))
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.feature, self.interim, self.update)
    }
}

/// Dotted numeric version such as `3.4.0` or `8.11`; missing trailing
/// components compare as zero.
#[derive(Debug, Clone)]
pub struct DottedVersion(Vec<u64>);

impl DottedVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let parts = raw
            .trim()
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(Self(parts))
        }
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for DottedVersion {}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse `major.minor[.patch]` as semver, padding a missing patch with zero.
pub fn loose_semver(raw: &str) -> Result<semver::Version> {
    let raw = raw.trim();
    let padded = match raw.matches('.').count() {
        0 => format!("{raw}.0.0"),
        1 => format!("{raw}.0"),
        _ => raw.to_string(),
    };
    semver::Version::parse(&padded).with_context(|| format!("invalid version '{raw}'"))
}

/// Parse a threshold from configuration, naming the setting on failure.
pub fn java_threshold(raw: &str) -> Result<JavaVersion> {
    JavaVersion::parse(raw).ok_or_else(|| anyhow!("invalid java version threshold '{raw}'"))
}
