pub mod extract;
pub mod observation_time;
pub mod request;
pub mod station;
