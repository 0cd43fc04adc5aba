use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ironjoin::config::ReconcileConfig;
use ironjoin::join::JoinKey;
use ironjoin::workflow;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    name = "ironjoin",
    about = "Reconcile identifiers from log dumps against database exports",
    version
)]
struct Opt {
    /// JSON configuration file; built-in defaults apply when absent
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Write the run report as JSON to this file
    #[clap(long, global = true)]
    report: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deduplicate trace ids and write search DSL query groups
    TraceGroups {
        /// Text file with one trace id per line
        source: PathBuf,
        /// Directory receiving `output/dsl_group-{n}.txt`
        #[clap(long)]
        out_dir: Option<PathBuf>,
    },
    /// Collect labeled values and customer tuples from CSV dumps
    Collect {
        /// Directory holding the dumps
        dir: PathBuf,
        /// Label whose `label=VALUE` values are collected
        #[clap(long)]
        filter: String,
    },
    /// Pack values into size-bounded SQL IN queries
    Sql {
        /// Text file with one value per line
        source: PathBuf,
        /// Unit suffix of the `AFIL`/`KFIL` schemas
        #[clap(long)]
        unit: String,
        /// Column filtered by the IN list
        #[clap(long)]
        filter: String,
    },
    /// Merge database export CSVs into one deduplicated file
    Merge {
        dir: PathBuf,
        /// Recover export rows from free-text dumps instead
        #[clap(long)]
        extract: bool,
    },
    /// Full outer join of export and customer data
    Join {
        dir: PathBuf,
        #[clap(long, value_enum, default_value = "customer")]
        key: KeyArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeyArg {
    Customer,
    Card,
    Account,
}

impl From<KeyArg> for JoinKey {
    fn from(key: KeyArg) -> Self {
        match key {
            KeyArg::Customer => JoinKey::Customer,
            KeyArg::Card => JoinKey::Card,
            KeyArg::Account => JoinKey::Account,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ironjoin=info")),
        )
        .with_target(false)
        .init();

    let opt = Opt::parse();
    let cfg = ReconcileConfig::load_or_default(opt.config.as_deref())?;

    let report = match opt.command {
        Command::TraceGroups { source, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| {
                source
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
            });
            workflow::group_trace_ids(&source, &out_dir, &cfg)?
        }
        Command::Collect { dir, filter } => workflow::collect_values(&dir, &filter, &cfg)?,
        Command::Sql {
            source,
            unit,
            filter,
        } => workflow::build_sql_batches(&source, &unit, &filter, &cfg)?,
        Command::Merge { dir, extract } => {
            if extract {
                workflow::extract_exports(&dir)?
            } else {
                workflow::merge_exports(&dir)?
            }
        }
        Command::Join { dir, key } => workflow::join_exports(&dir, key.into(), &cfg)?,
    };

    report.log();
    report.print();
    if let Some(path) = opt.report {
        report.save_to_file(path)?;
    }
    Ok(())
}
