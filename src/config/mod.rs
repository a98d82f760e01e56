pub mod schema;

pub use schema::{
    AwsConfig, ChecksConfig, Config, DependencyCheckConfig, DistroCheckConfig, DistroCutoff,
    HistoryConfig, JavaCheckConfig, NodeCheckConfig, NotifyConfig, PackageCheckConfig,
    PolicyConfig, ProbeConfig, QueueConfig, RegistryConfig, ReliabilityConfig, ReportBackend,
    ReportConfig,
};
