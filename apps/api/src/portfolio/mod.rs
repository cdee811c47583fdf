//! The portfolio record: wire model, validation rules, stored form and the
//! HTTP surface that submits, lists and edits it.

pub mod handlers;
pub mod model;
pub mod records;
pub mod validation;
