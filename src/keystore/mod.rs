//! Key Store Module
//!
//! Persists heterogeneous session key material so a protocol session
//! survives process restarts.

mod naming;
mod store;
mod value;


pub use naming::{category_prefix, parse_record_file_name, record_file_name, RecordId};
pub use store::{KeyRecords, KeyStore};
pub use value::KeyValue;
