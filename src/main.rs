//! artifact-dl server binary
//!
//! Loads configuration (TOML file, then command-line overrides), builds the
//! storage provider and serves the HTTP API until SIGINT/SIGTERM.

use artifact_dl::config::{GcsStorageConfig, LocalStorageConfig, S3StorageConfig};
use artifact_dl::extraction::ArchiveExtractor;
use artifact_dl::storage::{Storage, build_provider};
use artifact_dl::{Config, Downloader, StorageConfig, run_with_shutdown};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Storage backend selected on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BucketProto {
    /// Local directory acting as the bucket
    #[value(alias = "file")]
    Local,
    /// Amazon S3 or a compatible store
    S3,
    /// Google Cloud Storage
    #[value(name = "gs", alias = "gcs")]
    Gcs,
}

impl BucketProto {
    fn matches(self, storage: &StorageConfig) -> bool {
        matches!(
            (self, storage),
            (BucketProto::Local, StorageConfig::Local(_))
                | (BucketProto::S3, StorageConfig::S3(_))
                | (BucketProto::Gcs, StorageConfig::Gcs(_))
        )
    }

    /// Blank configuration of this backend kind
    fn blank(self) -> StorageConfig {
        match self {
            BucketProto::Local => StorageConfig::Local(LocalStorageConfig::new("")),
            BucketProto::S3 => StorageConfig::S3(S3StorageConfig::default()),
            BucketProto::Gcs => StorageConfig::Gcs(GcsStorageConfig::default()),
        }
    }
}

/// Log verbosity used when RUST_LOG is unset
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Fetch artifacts from blob storage, unpack them and keep the newest N.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum)]
    bucket_proto: Option<BucketProto>,

    /// Bucket name (a directory path for the local backend)
    #[arg(long)]
    bucket_name: Option<String>,

    /// Destination directory for downloads
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Entries to keep in the destination directory after an unarchive
    #[arg(long)]
    keep_old_count: Option<usize>,

    /// Address the HTTP server listens on
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// S3 region
    #[arg(long)]
    s3_region: Option<String>,

    /// S3 endpoint URL for compatible stores
    #[arg(long)]
    s3_endpoint: Option<String>,

    /// Use path-style S3 addressing
    #[arg(long)]
    s3_force_path_style: bool,

    /// Service account key file for Google Cloud Storage
    #[arg(long)]
    gcs_service_account: Option<PathBuf>,
}

impl Args {
    /// Layer command-line values over a loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.download_dir {
            config.download.download_dir = dir.clone();
        }
        if let Some(keep) = self.keep_old_count {
            config.download.keep_old_count = keep;
        }
        if let Some(listen) = self.listen {
            config.server.bind_address = listen;
        }

        // switching backend starts from a blank config of that kind
        if let Some(proto) = self.bucket_proto {
            if !proto.matches(&config.storage) {
                config.storage = proto.blank();
            }
        }

        match &mut config.storage {
            StorageConfig::Local(local) => {
                if let Some(bucket) = &self.bucket_name {
                    local.bucket = PathBuf::from(bucket);
                }
            }
            StorageConfig::S3(s3) => {
                if let Some(bucket) = &self.bucket_name {
                    s3.bucket = bucket.clone();
                }
                if let Some(region) = &self.s3_region {
                    s3.region = Some(region.clone());
                }
                if let Some(endpoint) = &self.s3_endpoint {
                    s3.endpoint = Some(endpoint.clone());
                }
                if self.s3_force_path_style {
                    s3.force_path_style = true;
                }
            }
            StorageConfig::Gcs(gcs) => {
                if let Some(bucket) = &self.bucket_name {
                    gcs.bucket = bucket.clone();
                }
                if let Some(path) = &self.gcs_service_account {
                    gcs.service_account_path = Some(path.clone());
                    gcs.access_json = None;
                }
            }
        }
    }

    fn load_config(&self) -> artifact_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn run(args: Args) -> artifact_dl::Result<()> {
    let config = args.load_config()?;
    let bind_address = config.server.bind_address;

    let storage = Storage::new(build_provider(&config.storage).await?);
    let downloader = Downloader::new(config, storage, Arc::new(ArchiveExtractor)).await?;

    run_with_shutdown(Arc::new(downloader), bind_address).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "artifact-dl stopped with an error");
            ExitCode::FAILURE
        }
    }
}
