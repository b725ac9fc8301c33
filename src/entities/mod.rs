pub mod actor;
pub mod director;
pub mod film;
pub mod film_cast;
pub mod review;
pub mod session;
pub mod user;
