pub mod local;
pub mod presenter;
