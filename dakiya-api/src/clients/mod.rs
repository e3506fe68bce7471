//! Outbound collaborator clients

pub mod catalog;
pub mod parcel;

pub use catalog::HttpCatalogSource;
pub use parcel::HttpParcelSubmitter;
