pub mod attributes;
pub mod query;
pub mod record;
pub mod value;
