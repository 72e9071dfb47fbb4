// Entity Models
//
// Categories carry a stable identifier assigned at ledger initialization.
// Records reference a category by that identifier and never change once built.

pub mod category;
pub mod record;

pub use category::{title_case, Category, CategoryId, CategoryRegistry};
pub use record::{parse_amount, parse_date, Record, StoredRecord, DATE_FORMAT, DESCRIPTION_LIMIT};
