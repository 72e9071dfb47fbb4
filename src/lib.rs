// AutoFinance - Core Library
// Personal-finance ledger: filter composition, aggregation and time series.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod error;
pub mod entities;
pub mod filter;
pub mod store;
pub mod stats;
pub mod aggregate;
pub mod series;
pub mod import;
pub mod input;
pub mod report;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use entities::{
    Category, CategoryId, CategoryRegistry,
    Record, StoredRecord,
};
pub use filter::{
    compose, DateRange, FilterCriteria, Predicate, SignSelector,
};
pub use store::{
    setup_database, init_ledger, open_ledger, list_categories,
    insert_batch, delete_matching, query_matching, peek, RecordOrder, DEFAULT_PEEK_LIMIT,
};
pub use aggregate::{
    count, sum, mean, population_variance, population_std_dev, median,
    top_by_amount, summarize, Extreme, RecordSummary,
};
pub use series::{
    daily_flow, monthly_flow, cumulative, running_total,
    FlowEntry, FlowSeries, Granularity, YearMonth,
};
pub use stats::SeriesSummary;
pub use import::{
    parse_lines, read_import_file, write_backup,
    ImportReport, LineFailure, DEFAULT_DELIMITER, TRANSFER_DELIMITER,
};
pub use input::{read_custom, read_delete, read_insert, CustomQuery, Params};
pub use report::{custom_report, main_report, CategoryStats, CustomReport, MainReport};
pub use config::{bootstrap, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
