pub mod apply;
mod command_result;
pub mod helper;
pub mod init;
pub mod match_catalog;
pub mod scan;

pub use command_result::*;
