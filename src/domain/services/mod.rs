//! # Domain Services
//!
//! エンティティに属さないビジネスルール

pub mod file_validation;
pub mod retry;
