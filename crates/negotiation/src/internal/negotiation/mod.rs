pub mod comm;
pub mod configuration;
pub mod fixup;
pub mod reject;
pub mod request;
pub mod rpc;
pub mod session;
pub mod source;
