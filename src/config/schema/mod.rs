mod checks;
mod core;
mod notify;
mod probe;
mod queue;
mod report;

pub use checks::{
    ChecksConfig, DependencyCheckConfig, DistroCheckConfig, DistroCutoff, HistoryConfig,
    JavaCheckConfig, NodeCheckConfig, PackageCheckConfig,
};
pub use self::core::{Config, PolicyConfig, ReliabilityConfig};
pub use notify::NotifyConfig;
pub use probe::ProbeConfig;
pub use queue::{AwsConfig, QueueConfig, RegistryConfig};
pub use report::{ReportBackend, ReportConfig};
