use clap::{ArgAction, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use sqlerror_enricher::error::{category, retry, timeout};
use sqlerror_enricher::logging::{init_logging, LoggingConfig};
use sqlerror_enricher::{
    ConnectionContext, EnricherOptions, ErrorCategory, ErrorRecord, RetryGuidance, SqlException,
    SqlExceptionEnricher, TimeoutType,
};

#[derive(Parser, Debug)]
#[command(name = "sqlerr")]
#[command(version)]
#[command(about = "Classify SQL Server errors into structured log properties")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the enriched properties for one error as JSON
    Classify {
        /// Vendor error number
        #[arg(allow_negative_numbers = true)]
        number: i32,

        /// Severity class (0-25)
        #[arg(long, short = 'c', default_value = "16")]
        class: u8,

        /// Error state
        #[arg(long, default_value = "1")]
        state: u8,

        /// Error message text
        #[arg(long, short, default_value = "")]
        message: String,

        /// Stored procedure name
        #[arg(long, default_value = "")]
        procedure: String,

        /// Server that raised the error
        #[arg(long, default_value = "")]
        server: String,

        /// Line number
        #[arg(long, default_value = "0")]
        line: i32,

        /// Data source of the connection
        #[arg(long)]
        data_source: Option<String>,

        /// Database of the connection
        #[arg(long)]
        database: Option<String>,

        /// Enricher options file (TOML)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Use dotted external attribute names
        #[arg(long)]
        otel: bool,

        /// Property name prefix
        #[arg(long, conflicts_with = "otel")]
        prefix: Option<String>,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// List every error number with curated classification data
    Codes {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Classify {
            number,
            class,
            state,
            message,
            procedure,
            server,
            line,
            data_source,
            database,
            config,
            otel,
            prefix,
            compact,
        } => {
            let mut options = match config.map(EnricherOptions::load).transpose() {
                Ok(options) => options.unwrap_or_default(),
                Err(err) => {
                    eprintln!("error: {err}");
                    return Ok(ExitCode::from(2));
                }
            };
            if otel {
                options.use_open_telemetry_semantics = true;
            }
            if let Some(prefix) = prefix {
                options.property_prefix = prefix;
            }

            let enricher = match SqlExceptionEnricher::new(options) {
                Ok(enricher) => enricher,
                Err(err) => {
                    eprintln!("error: {err}");
                    return Ok(ExitCode::from(2));
                }
            };

            let record = ErrorRecord::new(number, class)
                .with_state(state)
                .with_message(message)
                .with_procedure(procedure)
                .with_server(server)
                .with_line(line);
            let mut exception = SqlException::from_error(record);
            if data_source.is_some() || database.is_some() {
                exception = exception.with_connection(ConnectionContext::new(
                    data_source.unwrap_or_default(),
                    database.unwrap_or_default(),
                ));
            }

            let properties = enricher.enrich(&exception);
            let output = if compact {
                serde_json::to_string(&properties)?
            } else {
                serde_json::to_string_pretty(&properties)?
            };
            println!("{output}");
        }
        Commands::Codes { json } => {
            let codes: BTreeSet<i32> = category::known_codes()
                .into_iter()
                .chain(retry::known_codes())
                .collect();

            if json {
                let rows: Vec<serde_json::Value> = codes.iter().map(|c| code_row(*c)).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!(
                    "{:>6}  {:<12}  {:<10}  {:<6}  {:<11}  {:>6}  {:>3}  REASON",
                    "NUMBER", "CATEGORY", "TIMEOUT", "ORIGIN", "RETRY", "DELAY", "MAX"
                );
                for code in codes {
                    let guidance = RetryGuidance::for_code(code);
                    println!(
                        "{:>6}  {:<12}  {:<10}  {:<6}  {:<11}  {:>6}  {:>3}  {}",
                        code,
                        ErrorCategory::from_code(code).as_str(),
                        timeout_label(code),
                        origin_label(code),
                        guidance.strategy.as_str(),
                        guidance.delay_display(),
                        guidance.max_retries,
                        guidance.reason
                    );
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn timeout_label(code: i32) -> &'static str {
    if timeout::is_timeout(code) {
        TimeoutType::from_code(code).as_str()
    } else {
        "-"
    }
}

fn origin_label(code: i32) -> &'static str {
    if category::is_user_error(code) {
        "user"
    } else {
        "system"
    }
}

fn code_row(code: i32) -> serde_json::Value {
    let guidance = RetryGuidance::for_code(code);
    serde_json::json!({
        "number": code,
        "category": ErrorCategory::from_code(code).as_str(),
        "timeout": timeout::is_timeout(code).then(|| TimeoutType::from_code(code).as_str()),
        "user_error": category::is_user_error(code),
        "should_retry": guidance.should_retry,
        "strategy": guidance.strategy.as_str(),
        "delay": guidance.delay_display(),
        "max_retries": guidance.max_retries,
        "reason": guidance.reason,
    })
}
