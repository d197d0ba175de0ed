pub mod dispatch;
pub mod init;
pub mod logging;
pub mod run;
pub mod validate;

pub use dispatch::dispatch;
