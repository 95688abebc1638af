pub mod communication;
pub mod config;
pub mod controller;
pub mod logging;
pub mod motors;
