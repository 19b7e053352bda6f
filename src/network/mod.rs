// network/mod.rs - REST clients for the funding-rate sources
pub mod api_client;
