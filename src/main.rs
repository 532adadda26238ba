use s3_bucket_demo::{
    config::Config,
    demo::{Args, Demo, RunError, RunResult, S3Service},
    storage::credentials,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> RunResult<()> {
    let config = Config::from_env();
    let credentials = credentials::default(&config)
        .await
        .map_err(RunError::Setup)?;
    let service = S3Service::new(credentials, &config).map_err(RunError::Setup)?;

    Demo::new(service, &config, std::io::stdout())
        .run(&args.bucket, &args.file)
        .await
}

#[tokio::main]
async fn main() {
    let args = match Args::try_from_args(std::env::args_os()) {
        Ok(args) => args,
        Err(RunError::Argument(e)) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing();

    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
