pub mod formatter;

pub use formatter::{
    format_contests, format_header, format_json, format_table, format_tsv, should_use_colors,
    truncate_title,
};
