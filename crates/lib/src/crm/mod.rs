//! CRM backend client and the static category catalog.
//!
//! The client talks to a Zoho-style REST API (module metadata, record list,
//! record insert). The catalog pins the 13 categories this assistant serves,
//! their labels and synonyms, and the required fields for creation.

mod catalog;
mod client;

pub use catalog::{
    filter_catalog, missing_fields, Category, CategoryId, PHOTO_CREATABLE, SUPPORTED_CATEGORIES,
};
pub use client::{CrmClient, CrmError, RawModule, RecordMap, WriteItem, WriteResponse};
