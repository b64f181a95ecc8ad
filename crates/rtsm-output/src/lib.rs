//! Export projection for randomization runs.
//!
//! - **Allocation view**: sequence id, site, sex, arm
//! - **Dispensing view**: labels, sequence id, sex, site
//! - **Combined view**: allocation columns plus one column per label
//! - **Manifest**: seed, digests and file list of a run (JSON)
//!
//! Column names come from an [`ExportSchema`]; the REDCap mapping is one
//! preset among others.

mod csv_writer;
mod error;
mod export;
mod manifest;
pub mod schema;
mod views;

pub use csv_writer::{render_csv, write_table, write_table_csv};
pub use error::OutputError;
pub use export::{OutputOptions, write_outputs};
pub use manifest::{ArmManifest, OutputPaths, RunManifest};
pub use schema::{
    AllocationColumns, ArmValue, CombinedColumns, DispensingColumns, ExportSchema, SchemaPreset, SexValues,
};
pub use views::{Table, allocation_view, combined_view, dispensing_view, render_labels};
