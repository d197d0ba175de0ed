//! Process exit codes.

pub const SUCCESS: i32 = 0;
/// Bad configuration, or a database that could not be opened.
pub const CONFIG_ERROR: i32 = 2;
