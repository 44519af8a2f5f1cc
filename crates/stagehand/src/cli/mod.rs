pub mod app;
pub mod unpack;
