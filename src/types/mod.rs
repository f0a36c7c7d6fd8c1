pub mod records;

pub use records::{
    ContactRecord, JobRecord, TableKind, TableRecord, CONTACT_HEADERS, JOB_HEADERS,
    TIMESTAMP_FORMAT,
};
