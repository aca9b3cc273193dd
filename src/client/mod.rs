//! Per-client rollups across all of a tenant's jobs.

mod core;

pub use core::{
    Client, create_client_table, get_client_by_name, get_or_create_client, list_clients,
    map_client_row, recompute_rollup,
};
