use std::fmt::Debug;
use std::process;

use clap::Parser;
use isodemo_cli::{App, Command, ConnectionArgs, RunArgs};
use isodemo_core::{run_all, Backend, ScenarioReport};
use isodemo_drivers::AnyBackend;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    match &app.command {
        Command::Run(args) => run(args).await,
        Command::Bootstrap(args) => bootstrap(args).await,
    }
}

fn fail(err: &impl Debug) -> ! {
    eprintln!("{err:#?}");
    process::exit(1);
}

fn connect(args: &ConnectionArgs) -> AnyBackend {
    let backend = AnyBackend::new(&args.config()).unwrap_or_else(|e| fail(&e));
    tracing::debug!(database = %args.database, "parsed connection options");
    backend
}

async fn bootstrap(args: &ConnectionArgs) {
    match connect(args) {
        AnyBackend::MySql(backend) => backend.bootstrap().await,
        AnyBackend::Postgres(backend) => backend.bootstrap().await,
    }
    .unwrap_or_else(|e| fail(&e));

    println!("Recreated database {}", args.database);
}

async fn run(args: &RunArgs) {
    let reports = match connect(&args.connection) {
        AnyBackend::MySql(backend) => run_with(&backend, args).await,
        AnyBackend::Postgres(backend) => run_with(&backend, args).await,
    };

    let deviations: Vec<_> = reports
        .iter()
        .filter(|report| !report.matches_expected())
        .map(|report| report.scenario.name())
        .collect();

    if args.strict && !deviations.is_empty() {
        eprintln!("Unexpected observations in: {}", deviations.join(", "));
        process::exit(1);
    }
}

async fn run_with<B>(backend: &B, args: &RunArgs) -> Vec<ScenarioReport>
where
    B: Backend,
{
    let print = |report: &ScenarioReport| {
        if args.json {
            match serde_json::to_string(report) {
                Ok(json) => println!("{json}"),
                Err(e) => fail(&e),
            }
        } else {
            print!("{report}");
        }
    };

    run_all(backend, &args.scenarios(), print)
        .await
        .unwrap_or_else(|e| fail(&e))
}
