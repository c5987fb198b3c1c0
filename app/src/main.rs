use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use default_plots::{ExperimentKind, PLOT_MODULES};
use eyre::Result;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod report;

#[derive(Parser)]
#[command(version, about = "Charts and summary tables for benchmark timing results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the configured charts and print the summary table
    Plot {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
        /// Results CSV, overrides the config file
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Chart directory, overrides the config file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Do not print the summary table
        #[arg(long, default_value_t = false)]
        skip_table: bool,
    },
    /// Print the summary table of a results file
    Table {
        #[arg(short, long)]
        input: PathBuf,
        /// Runs averaged per row, shown in the table title
        #[arg(long, default_value_t = 5)]
        num_runs: usize,
    },
    /// Print a default config for an experiment
    Init {
        #[arg(short, long, value_enum)]
        kind: Kind,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Saxpy,
    ParallelRegion,
}

impl From<Kind> for ExperimentKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Saxpy => ExperimentKind::Saxpy,
            Kind::ParallelRegion => ExperimentKind::ParallelRegion,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("bench_report={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in PLOT_MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_plots::init_plots();

    let res = match args.command {
        Commands::Plot {
            config_file,
            input,
            output,
            skip_table,
        } => {
            let mut config = report::load_config(&config_file).await?;
            report::apply_overrides(&mut config, input, output);
            report::run_plots(&config, args.no_progress, skip_table).await
        }
        Commands::Table { input, num_runs } => report::print_table(&input, num_runs),
        Commands::Init {
            kind,
            input,
            output,
        } => {
            let config = ExperimentKind::from(kind).default_config(input, output);
            print!("{}", serde_yml::to_string(&config)?);
            Ok(())
        }
    };

    if let Err(err) = &res {
        error!("{err:#?}");
    }
    res
}
