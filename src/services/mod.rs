pub mod security_api;
