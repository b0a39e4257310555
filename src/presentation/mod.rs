pub mod app;
pub mod components;
pub mod joystick;
pub mod pad;
pub mod tabs;
pub mod theme;
