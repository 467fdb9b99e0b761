//! io module : base dataset reading and node pair manifest dump/reload

/// read base graphs from csv
pub mod csv;

/// bson dump and reload of node pair manifests
pub mod bson;
