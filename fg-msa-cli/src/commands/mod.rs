pub mod align;
pub mod command;
pub mod merge_chunks;
