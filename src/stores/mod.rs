pub mod durable_kv;
pub mod kv;
pub mod record_store;
