pub mod command;
pub mod record;
pub mod station;
pub mod status;
pub mod window;
