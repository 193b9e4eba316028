pub mod http;
pub mod stub_backend;
