pub mod flow;
pub mod routes;
pub mod server;
pub mod session_store;
