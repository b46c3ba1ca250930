//! Companies and their employees

pub mod model;
pub mod service;

pub use model::{CompanyRequest, CompanyResponse, EmployeeRequest, EmployeeResponse};
pub use service::DirectoryService;
