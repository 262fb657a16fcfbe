pub mod dispatcher;
pub mod frame;
pub mod protocol;
pub mod reactor;
pub mod server;
pub mod worker_pool;
