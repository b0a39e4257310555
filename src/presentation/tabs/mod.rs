pub mod home;
pub mod remote;
pub mod settings;
