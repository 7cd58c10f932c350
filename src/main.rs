use argh::FromArgs;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use weather_etl::{
    invoke_remote, EtlConfig, EtlError, InboundPayload, MemoryWarehouse, WeatherPipeline,
};

#[derive(FromArgs)]
/// Fetch weather for a set of locations and load it into BigQuery
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunArgs),
    Serve(ServeArgs),
    Trigger(TriggerArgs),
}

/// Run the pipeline once and exit
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunArgs {
    /// path to a YAML config file (default: environment only)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// load into an in-memory warehouse instead of BigQuery
    #[argh(switch)]
    dry_run: bool,

    /// JSON body to run with, as a trigger would send it
    #[argh(option, short = 'p')]
    payload: Option<String>,
}

/// Serve the HTTP trigger endpoint
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
struct ServeArgs {
    /// path to a YAML config file (default: environment only)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// address to listen on (default: 0.0.0.0:8080)
    #[argh(option, short = 'a', default = "SocketAddr::from(([0, 0, 0, 0], 8080))")]
    addr: SocketAddr,
}

/// POST to a deployed instance to start a run there
#[derive(FromArgs)]
#[argh(subcommand, name = "trigger")]
struct TriggerArgs {
    /// endpoint URL of the deployed instance
    #[argh(option, short = 'u')]
    url: String,

    /// JSON body to send (default: {})
    #[argh(option, short = 'd', default = "String::from(\"{}\")")]
    data: String,
}

fn load_config(path: Option<&PathBuf>) -> Result<EtlConfig, EtlError> {
    let config = match path {
        Some(path) => EtlConfig::load(path)?,
        None => EtlConfig::from_env()?,
    };
    Ok(config)
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_ref())?;
    let payload = match args.payload {
        Some(text) => InboundPayload::Raw(text),
        None => InboundPayload::Structured(Value::Object(Default::default())),
    };

    let status = if args.dry_run {
        log::info!("Dry run: loading into an in-memory warehouse");
        WeatherPipeline::from_config(&config, MemoryWarehouse::new())
            .handle(payload)
            .await?
    } else {
        WeatherPipeline::bigquery(&config)
            .await?
            .handle(payload)
            .await?
    };
    println!("{status}");
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_ref())?;
    let pipeline = WeatherPipeline::bigquery(&config).await?;
    weather_etl::server::serve(args.addr, pipeline).await?;
    Ok(())
}

async fn trigger(args: TriggerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let body: Value = serde_json::from_str(&args.data)?;
    let response = invoke_remote(&args.url, &body).await?;
    println!("{response}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();
    let result = match args.command {
        Command::Run(args) => run(args).await,
        Command::Serve(args) => serve(args).await,
        Command::Trigger(args) => trigger(args).await,
    };

    if let Err(e) = result {
        log::error!("{}", weather_etl::error_chain(e.as_ref()));
        std::process::exit(1);
    }
}
