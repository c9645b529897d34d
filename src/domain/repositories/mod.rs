pub mod remote_api;
