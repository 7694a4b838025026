use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};
use typed_object_store::{
    BucketLifecycle,
    adapters::outbound::storage::S3Config,
    app::{AppBuilder, AppConfig, AppServices, StorageBackend},
};

#[derive(Parser, Debug)]
#[command(name = "typed-store-cli")]
#[command(about = "CLI for the typed object store", long_about = None)]
struct Cli {
    /// Storage backend type
    #[arg(long, env = "STORAGE_BACKEND", default_value = "memory")]
    storage_backend: String,

    /// Bucket to operate on
    #[arg(short, long, env = "S3_BUCKET", default_value = "typed-object-store")]
    bucket: String,

    /// S3 endpoint URL (for MinIO and other S3-compatible stores)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Allow plain http endpoints
    #[arg(long, env = "S3_ALLOW_HTTP", default_value = "false")]
    s3_allow_http: bool,

    /// Caller tag recorded in logs and errors
    #[arg(long, env = "CALLER_TAG", default_value = "typed-store-cli")]
    caller_tag: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the bucket, succeeding if it is already yours
    CreateBucket,

    /// Delete the bucket, which must be empty
    DeleteBucket,

    /// Delete every object in the bucket, then the bucket
    PurgeBucket,

    /// List keys
    List {
        /// Prefix to filter keys
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Download an object and print it as JSON
    Get {
        /// Object key
        key: String,
    },

    /// Upload a JSON document
    Put {
        /// Object key
        key: String,
        /// JSON file to upload
        file: String,
    },

    /// Delete every object under a prefix
    DeletePrefix {
        prefix: String,
    },

    /// Delete a single object
    DeleteKey {
        key: String,
    },
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.storage_backend.as_str() {
            "memory" => StorageBackend::InMemory,
            "s3" => StorageBackend::S3(S3Config {
                region: self.s3_region.clone(),
                endpoint: self.s3_endpoint.clone(),
                access_key: self.s3_access_key.clone(),
                secret_key: self.s3_secret_key.clone(),
                allow_http: self.s3_allow_http,
            }),
            _ => anyhow::bail!("Unknown storage backend: {}", self.storage_backend),
        };

        Ok(AppConfig {
            storage_backend,
            bucket: self.bucket.clone(),
            caller_tag: self.caller_tag.clone(),
        })
    }

    fn init_logging(&self) -> Result<()> {
        let level = match self.log_level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            "off" => LevelFilter::OFF,
            other => anyhow::bail!("Unknown log level: {other}"),
        };

        // stdout is reserved for command output
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(level)
            .init();

        Ok(())
    }
}

async fn run(command: Commands, bucket: &str, app: AppServices) -> Result<()> {
    let AppServices {
        typed_store,
        bucket_lifecycle,
    } = app;

    match command {
        Commands::CreateBucket => bucket_lifecycle.create_bucket(bucket).await?,
        Commands::DeleteBucket => bucket_lifecycle.delete_bucket(bucket).await?,
        Commands::PurgeBucket => bucket_lifecycle.purge_bucket(bucket).await?,
        Commands::List { prefix } => {
            for key in typed_store.list_keys(&prefix).await? {
                println!("{key}");
            }
        }
        Commands::Get { key } => {
            let value: serde_json::Value = typed_store.download_object(&key).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Put { key, file } => {
            let raw = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {file}"))?;
            let value: serde_json::Value = serde_json::from_slice(&raw)
                .with_context(|| format!("{file} is not valid JSON"))?;
            typed_store.upload_object(&key, &value).await?;
        }
        Commands::DeletePrefix { prefix } => typed_store.delete_by_prefix(&prefix).await?,
        Commands::DeleteKey { key } => typed_store.delete_object(&key).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    info!(
        backend = %cli.storage_backend,
        bucket = %cli.bucket,
        "starting typed-store-cli"
    );

    let config = cli.to_app_config()?;
    let app = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    run(cli.command, &cli.bucket, app).await
}
