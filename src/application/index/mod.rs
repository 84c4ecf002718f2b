pub mod controller;

pub use controller::register;
