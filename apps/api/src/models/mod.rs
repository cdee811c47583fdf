pub mod access;
pub mod portfolio;
