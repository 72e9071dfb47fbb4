use anyhow::{bail, Context, Result};
use chrono::Local;
use rusqlite::Connection;
use std::env;
use std::fs::File;
use std::path::Path;

use autofinance::{
    bootstrap, compose, custom_report, delete_matching, insert_batch, list_categories,
    logging, main_report, peek, query_matching, read_custom, read_delete, read_import_file,
    write_backup, Config, Params, RecordOrder, DEFAULT_DELIMITER, DEFAULT_PEEK_LIMIT,
};

const USAGE: &str = "Usage: autofinance <command> [args]

Commands:
  init                                  Create the ledger (seeding it from AUTOFINANCE_DATA_SOURCE)
  import <file> [--delimiter C]         Import category,description,amount,date lines
  peek [limit]                          Show the most recent records (default 30)
  report                                Overview report as JSON
  custom [--start D] [--end D] [--category C] [--sign S] [--description T]
                                        Report over a custom filter as JSON
  delete --category C --start D [--end D] [--description T]
                                        Delete matching records
  backup <file>                         Write a pipe-delimited backup";

fn main() -> Result<()> {
    logging::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env();

    match args.first().map(String::as_str) {
        Some("init") => run_init(&config),
        Some("import") => run_import(&config, &args[1..]),
        Some("peek") => run_peek(&config, &args[1..]),
        Some("report") => run_report(&config),
        Some("custom") => run_custom(&config, &args[1..]),
        Some("delete") => run_delete(&config, &args[1..]),
        Some("backup") => run_backup(&config, &args[1..]),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn open(config: &Config) -> Result<Connection> {
    bootstrap(config)
        .with_context(|| format!("Failed to open ledger at {}", config.database.display()))
}

fn run_init(config: &Config) -> Result<()> {
    let existed = config.database.exists();
    let conn = open(config)?;
    let count = peek(&conn, None)?.len();

    if existed {
        println!("✓ Ledger already present at {}", config.database.display());
    } else {
        println!("✓ Ledger created at {}", config.database.display());
    }
    println!("✓ Ledger contains {} records", count);
    Ok(())
}

fn run_import(config: &Config, args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("import requires a file path");
    };
    let flags = parse_flags(&args[1..])?;
    let delimiter = match flags.get("delimiter") {
        Some(d) if d.chars().count() == 1 => d.chars().next().unwrap_or(DEFAULT_DELIMITER),
        Some(d) => bail!("Delimiter must be a single character, got '{}'", d),
        None => DEFAULT_DELIMITER,
    };

    let mut conn = open(config)?;
    let registry = list_categories(&conn)?;

    println!("📂 Loading {}...", path);
    let report = read_import_file(Path::new(path), &registry, delimiter)
        .with_context(|| format!("Failed to read import file {}", path))?;

    for failure in &report.failures {
        println!("✗ line {}: {} for record: {}", failure.line, failure.error, failure.content);
    }

    let inserted = insert_batch(&mut conn, &report.records)?;
    println!("✓ Inserted: {} records", inserted);
    println!("✓ Skipped: {} lines", report.failures.len());
    Ok(())
}

fn run_peek(config: &Config, args: &[String]) -> Result<()> {
    let limit = match args.first() {
        Some(text) => text
            .parse::<usize>()
            .with_context(|| format!("Invalid limit: {}", text))?,
        None => DEFAULT_PEEK_LIMIT,
    };

    let conn = open(config)?;
    let records = peek(&conn, Some(limit))?;
    if records.is_empty() {
        println!("No Data Available");
        return Ok(());
    }

    println!("{:<12} {:<40} {:>12} {:<10}", "Type", "Description", "Amount", "Date");
    for record in records {
        println!(
            "{:<12} {:<40} {:>12.2} {}",
            record.category,
            truncate(&record.description, 40),
            record.amount,
            record.date
        );
    }
    Ok(())
}

fn run_report(config: &Config) -> Result<()> {
    let conn = open(config)?;
    let registry = list_categories(&conn)?;

    let report = main_report(&conn, &registry, Local::now().date_naive())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_custom(config: &Config, args: &[String]) -> Result<()> {
    let query = read_custom(&parse_flags(args)?)?;

    let conn = open(config)?;
    let registry = list_categories(&conn)?;

    let report = custom_report(&conn, &registry, &query)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_delete(config: &Config, args: &[String]) -> Result<()> {
    let criteria = read_delete(&parse_flags(args)?)?;

    let mut conn = open(config)?;
    let registry = list_categories(&conn)?;
    let predicate = compose(&criteria, &registry)?;

    let matched = query_matching(&conn, &predicate, RecordOrder::Newest, None)?;
    println!("🔍 {} record(s) match", matched.len());

    let deleted = delete_matching(&mut conn, &predicate)?;
    println!("✓ Deleted {} record(s)", deleted);
    Ok(())
}

fn run_backup(config: &Config, args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("backup requires an output path");
    };

    let conn = open(config)?;
    let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    let written = write_backup(&conn, file)?;

    println!("✓ Backed up {} records to {}", written, path);
    Ok(())
}

/// `--key value` pairs → parameter map
fn parse_flags(args: &[String]) -> Result<Params> {
    let mut params = Params::new();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        let Some(key) = flag.strip_prefix("--") else {
            bail!("Unexpected argument: {}", flag);
        };
        let Some(value) = iter.next() else {
            bail!("Missing value for --{}", key);
        };
        params.insert(key.to_string(), value.clone());
    }

    Ok(params)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
