pub mod batch;
pub mod error;
pub mod http_source;
pub mod memory;
pub mod metar_model;
pub mod record_source;
