pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod filter;
pub mod noop_dispatch;
pub mod profile;
pub mod record;
pub mod shutdown;
pub mod trace;

pub mod init;
pub mod layer;
