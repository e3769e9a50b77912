pub mod location;
pub mod route;
pub mod vehicle;
