pub mod architecture;
pub mod artifacts;
pub mod builder;
pub mod claude_api;
pub mod completion;
pub mod config;
pub mod context;
pub mod db_check;
pub mod prompts;
pub mod schema_render;
