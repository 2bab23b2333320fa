pub mod api;
pub mod cache;
pub mod config;
pub mod cookie;
pub mod counting;
pub mod csv_export;
pub mod csv_import;
pub mod doctor;
pub mod http;
pub mod items_table;
pub mod model;
#[cfg(test)]
pub(crate) mod test_support;
