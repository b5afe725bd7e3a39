//! Discover which versions of each api a broker serves.

pub mod request;
pub mod response;

/// The newest version served, older clients may use 0.
pub const API_VERSION: i16 = 1;
