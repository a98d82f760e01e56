use serde::{Deserialize, Serialize};

/// Thresholds for the check battery. These track specific upstream releases
/// and are expected to move over time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksConfig {
    #[serde(default)]
    pub java: JavaCheckConfig,
    #[serde(default)]
    pub dependency: DependencyCheckConfig,
    #[serde(default)]
    pub node: NodeCheckConfig,
    #[serde(default)]
    pub distro: DistroCheckConfig,
    #[serde(default)]
    pub packages: PackageCheckConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaCheckConfig {
    /// Oldest JVM accepted without a warning, in `java -version` notation.
    #[serde(default = "default_java_minimum")]
    pub minimum_version: String,
    /// Container-aware heap flag the JVM is expected to accept.
    #[serde(default = "default_heap_flag")]
    pub heap_flag: String,
}

fn default_java_minimum() -> String {
    "1.8.0_131".into()
}

fn default_heap_flag() -> String {
    "-XX:+UseCGroupMemoryLimitForHeap".into()
}

impl Default for JavaCheckConfig {
    fn default() -> Self {
        Self {
            minimum_version: default_java_minimum(),
            heap_flag: default_heap_flag(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyCheckConfig {
    /// Jar file stem searched for, e.g. `<artifact>-0.12.0.jar`.
    #[serde(default = "default_artifact")]
    pub artifact: String,
    #[serde(default = "default_search_root")]
    pub search_root: String,
    /// Oldest acceptable release (semver).
    #[serde(default = "default_dependency_minimum")]
    pub minimum_version: String,
}

fn default_artifact() -> String {
    "jmx_prometheus_javaagent".into()
}

fn default_search_root() -> String {
    "/".into()
}

fn default_dependency_minimum() -> String {
    "0.13.0".into()
}

impl Default for DependencyCheckConfig {
    fn default() -> Self {
        Self {
            artifact: default_artifact(),
            search_root: default_search_root(),
            minimum_version: default_dependency_minimum(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCheckConfig {
    /// Highest end-of-life major release; `0..=eol_major_max` warns.
    #[serde(default = "default_eol_major_max")]
    pub eol_major_max: u64,
}

fn default_eol_major_max() -> u64 {
    7
}

impl Default for NodeCheckConfig {
    fn default() -> Self {
        Self {
            eol_major_max: default_eol_major_max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistroCutoff {
    /// Family tag emitted by the probe (`ALPINE`, `DEBIAN`).
    pub family: String,
    /// Releases strictly below this dotted version are considered old.
    pub minimum: String,
    /// Base image recommended in the warning.
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistroCheckConfig {
    #[serde(default = "default_cutoffs")]
    pub cutoffs: Vec<DistroCutoff>,
}

fn default_cutoffs() -> Vec<DistroCutoff> {
    vec![
        DistroCutoff {
            family: "ALPINE".into(),
            minimum: "3.7".into(),
            suggestion: "alpine:3.8".into(),
        },
        DistroCutoff {
            family: "DEBIAN".into(),
            minimum: "9".into(),
            suggestion: "debian:stretch-slim".into(),
        },
    ]
}

impl Default for DistroCheckConfig {
    fn default() -> Self {
        Self {
            cutoffs: default_cutoffs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageCheckConfig {
    /// Regex over package-manager lines; capture group 1 is the patch level.
    #[serde(default = "default_package_pattern")]
    pub package_pattern: String,
    #[serde(default = "default_minimum_patch")]
    pub minimum_patch: u64,
}

fn default_package_pattern() -> String {
    r"^openjdk-?8-jre[^\s=]*?[-=]8[.u](\d+)".into()
}

fn default_minimum_patch() -> u64 {
    171
}

impl Default for PackageCheckConfig {
    fn default() -> Self {
        Self {
            package_pattern: default_package_pattern(),
            minimum_patch: default_minimum_patch(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
}

fn default_wrap_width() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
        }
    }
}
