//! Company and employee records with their request/response DTOs

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::infrastructure::clock::serialize_rfc3339;

/// Stored company row
#[derive(Debug, Clone)]
pub struct Company {
    pub id: u64,
    pub name: String,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Stored employee row
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub company_id: Option<u64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub company_id: Option<u64>,
}

/// Employee as listed inside a company
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    pub id: u64,
    pub name: String,
    pub address: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub updated_at: OffsetDateTime,
    /// `None` on create/update answers, which skip the member lookup
    pub employees: Option<Vec<EmployeeSummary>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub company_id: Option<u64>,
    pub company_name: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Employee> for EmployeeSummary {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
            position: employee.position.clone(),
        }
    }
}

impl CompanyResponse {
    pub fn with_employees<'a>(company: &Company, employees: impl IntoIterator<Item = &'a Employee>) -> Self {
        let mut response = Self::without_employees(company);
        response.employees = Some(employees.into_iter().map(EmployeeSummary::from).collect());
        response
    }

    pub fn without_employees(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            address: company.address.clone(),
            created_at: company.created_at,
            updated_at: company.updated_at,
            employees: None,
        }
    }
}

impl EmployeeResponse {
    pub fn new(employee: &Employee, company: Option<&Company>) -> Self {
        Self {
            id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
            position: employee.position.clone(),
            company_id: company.map(|c| c.id),
            company_name: company.map(|c| c.name.clone()),
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}
