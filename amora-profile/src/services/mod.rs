pub mod discovery;
pub mod distance;
pub mod images;
pub mod location;
pub mod profile_service;
pub mod reviews;
pub mod trust;
