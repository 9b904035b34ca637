pub mod error;
pub mod todo_service;
pub mod validation;
