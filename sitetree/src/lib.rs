// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export the helpers integration tests and embedders use
pub use handlers::{
    CliContext, ImportRequest, execute_import, execute_preview, load_mappings, load_table,
    open_database, parse_field_arg, resolve_path,
};
