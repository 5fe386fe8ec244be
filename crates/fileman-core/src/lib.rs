// Directory browser core: wire protocol, operation service, dispatch,
// and the TCP server loop.

pub mod config;
pub mod ops;
pub mod protocol;
pub mod server;
pub mod service;
