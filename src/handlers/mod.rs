pub mod actions;
pub mod flows;
pub mod health;
pub mod profile;
