//! Create topics on the controller.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 3;
