pub mod error_reporting;
pub mod jwt;
