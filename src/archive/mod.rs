//! The quote archive: people, their quotes, and identity resolution.
//!
//! Store operations are free functions over a [`rusqlite::Connection`]. Writes
//! take `&mut Connection` and run in a single transaction each.

pub mod person;
pub mod quote;
pub mod resolve;
pub mod transfer;
pub mod types;

pub use person::{
    all_people, create_person, delete_person, get_person, people_by_first_name,
    person_by_display_name, person_by_ghost_id, person_by_platform_id, random_person,
    update_person,
};
pub use quote::{
    count_quotes, create_quote, delete_quote, get_quote, has_any_quotes,
    has_said, quote_for_person, quotes_for_person, random_quote_any_person,
    random_quotes_for_person, update_quote,
};
pub use resolve::{create_from_profile, resolve, resolve_person, sync_profile, Resolution};
pub use transfer::{export_entries, import_entries, ArchiveEntry, ImportSummary};
pub use types::{NewPerson, Person, PersonUpdate, Quote, QuoteUpdate};
