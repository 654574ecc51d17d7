pub mod app_context;
pub mod fs_adapter;
