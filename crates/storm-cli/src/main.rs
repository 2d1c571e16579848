//! storm CLI
//!
//! Command-line tool for running schema files and inspecting the catalog.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use storm_core::ddl::create_sequence_sql;
use storm_core::TableName;
use storm_orm::catalog::{column_exists, sequence_exists, table_exists};
use storm_orm::{run_raw, ConnectorConfig, PgExecutor};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Schema files and catalog inspection for storm entities.
#[derive(Parser)]
#[command(name = "storm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Server host.
    #[arg(long, env = "PGHOST", default_value = "localhost", global = true)]
    host: String,

    /// Server port.
    #[arg(long, env = "PGPORT", default_value_t = 5432, global = true)]
    port: u16,

    /// Login role.
    #[arg(short = 'U', long, env = "PGUSER", default_value = "postgres", global = true)]
    username: String,

    /// Password.
    #[arg(long, env = "PGPASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Database name.
    #[arg(short, long, env = "PGDATABASE", default_value = "postgres", global = true)]
    database: String,

    /// Log statement failures at debug level only.
    #[arg(short, long, env = "STORM_QUIET", global = true)]
    quiet: bool,
}

impl ConnectionArgs {
    fn config(&self) -> ConnectorConfig {
        ConnectorConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            quiet: self.quiet,
            ..ConnectorConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a schema file verbatim.
    Setup {
        /// SQL file to run.
        #[arg(short, long)]
        file: PathBuf,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Report whether a table, its columns and its sequence exist.
    Inspect {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// Schema (current schema if not specified).
        #[arg(short, long)]
        schema: Option<String>,

        /// Columns to check.
        #[arg(short, long)]
        column: Vec<String>,
    },

    /// Print the CREATE SEQUENCE statement for an auto-increment key.
    SequenceSql {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// Schema.
        #[arg(short, long)]
        schema: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Setup { file, dry_run } => {
            let sql = std::fs::read_to_string(&file)?;
            if sql.trim().is_empty() {
                warn!(file = %file.display(), "Schema file is empty, nothing to run");
                return Ok(());
            }

            if dry_run {
                println!("{sql}");
                return Ok(());
            }

            let executor = PgExecutor::connect(&cli.connection.config()).await?;
            run_raw(&executor, &sql, false).await?;
            info!(file = %file.display(), "Schema file applied");
        }

        Commands::Inspect {
            table,
            schema,
            column,
        } => {
            let executor = PgExecutor::connect(&cli.connection.config()).await?;
            let table = TableName::new(table).in_schema(schema);

            let exists = table_exists(&executor, &table).await?;
            println!("table {}: {}", table.qualified(), presence(exists));
            if !exists {
                return Ok(());
            }

            for name in &column {
                let found = column_exists(&executor, &table, name).await?;
                println!("  column {}: {}", name.to_lowercase(), presence(found));
            }

            let sequenced = sequence_exists(&executor, &table).await?;
            println!("  sequence {}: {}", table.qualified_sequence(), presence(sequenced));
        }

        Commands::SequenceSql { table, schema } => {
            let table = TableName::new(table).in_schema(schema);
            println!("{}", create_sequence_sql(&table));
        }
    }

    Ok(())
}

const fn presence(exists: bool) -> &'static str {
    if exists {
        "present"
    } else {
        "missing"
    }
}
