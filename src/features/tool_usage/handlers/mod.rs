pub mod tool_usage_handler;

pub use tool_usage_handler::{
    __path_get_stats, __path_list_usage, __path_record_usage, get_stats, list_usage, record_usage,
};
