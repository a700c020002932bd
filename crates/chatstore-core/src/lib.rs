//! Storage contract and event ingestion for chatstore.
//!
//! This crate defines the "port" (the `ChatStorageRepository` trait) that
//! the infrastructure layer implements once per backend, and the ingestion
//! translator that turns protocol events into stored records. It depends
//! only on `chatstore-types`, never on `chatstore-infra` or a database
//! crate.

pub mod ingest;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;
