//! In-memory company/employee store
//!
//! Missing references and blank names are raised as caller faults; the
//! pipeline turns them into 400 envelopes.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tracing::Level;

use super::model::{
    Company, CompanyRequest, CompanyResponse, Employee, EmployeeRequest, EmployeeResponse,
};
use crate::pipeline::Fault;

#[derive(Debug, Default)]
struct DirectoryState {
    companies: BTreeMap<u64, Company>,
    employees: BTreeMap<u64, Employee>,
    next_company_id: u64,
    next_employee_id: u64,
}

impl DirectoryState {
    fn company(&self, id: u64) -> Result<&Company, Fault> {
        self.companies.get(&id).ok_or_else(|| Fault::not_found("Company", id))
    }

    fn employee(&self, id: u64) -> Result<&Employee, Fault> {
        self.employees.get(&id).ok_or_else(|| Fault::not_found("Employee", id))
    }

    fn members(&self, company_id: u64) -> impl Iterator<Item = &Employee> {
        self.employees
            .values()
            .filter(move |e| e.company_id == Some(company_id))
    }

    fn employee_response(&self, employee: &Employee) -> EmployeeResponse {
        let company = employee.company_id.and_then(|id| self.companies.get(&id));
        EmployeeResponse::new(employee, company)
    }
}

/// Company and employee operations over a shared store
#[derive(Debug, Default)]
pub struct DirectoryService {
    state: RwLock<DirectoryState>,
}

fn required_name(name: Option<String>) -> Result<String, Fault> {
    match name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => Ok(n),
        _ => Err(Fault::invalid_input("name must not be blank")),
    }
}

impl DirectoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_company(&self, request: CompanyRequest) -> Result<CompanyResponse, Fault> {
        crate::log_directory!(
            Level::INFO,
            "createCompany - name: {:?}, address: {:?}",
            request.name,
            request.address
        );
        let name = required_name(request.name)?;

        let mut state = self.state.write();
        state.next_company_id += 1;
        let now = OffsetDateTime::now_utc();
        let company = Company {
            id: state.next_company_id,
            name,
            address: request.address,
            created_at: now,
            updated_at: now,
        };
        let response = CompanyResponse::without_employees(&company);
        state.companies.insert(company.id, company);
        Ok(response)
    }

    pub fn get_company(&self, id: u64) -> Result<CompanyResponse, Fault> {
        crate::log_directory!(Level::INFO, "getCompany - id: {}", id);
        let state = self.state.read();
        let company = state.company(id)?;
        Ok(CompanyResponse::with_employees(company, state.members(id)))
    }

    pub fn list_companies(&self) -> Vec<CompanyResponse> {
        crate::log_directory!(Level::INFO, "getAllCompanies");
        let state = self.state.read();
        state
            .companies
            .values()
            .map(|c| CompanyResponse::with_employees(c, state.members(c.id)))
            .collect()
    }

    pub fn update_company(&self, id: u64, request: CompanyRequest) -> Result<CompanyResponse, Fault> {
        crate::log_directory!(
            Level::INFO,
            "updateCompany - id: {}, name: {:?}, address: {:?}",
            id,
            request.name,
            request.address
        );
        let mut state = self.state.write();
        state.company(id)?;
        let name = required_name(request.name)?;

        let company = state
            .companies
            .get_mut(&id)
            .ok_or_else(|| Fault::not_found("Company", id))?;
        company.name = name;
        company.address = request.address;
        company.updated_at = OffsetDateTime::now_utc();
        Ok(CompanyResponse::without_employees(company))
    }

    /// Remove a company and every employee attached to it
    pub fn delete_company(&self, id: u64) -> Result<(), Fault> {
        crate::log_directory!(Level::INFO, "deleteCompany - id: {}", id);
        let mut state = self.state.write();
        state
            .companies
            .remove(&id)
            .ok_or_else(|| Fault::not_found("Company", id))?;
        state.employees.retain(|_, e| e.company_id != Some(id));
        Ok(())
    }

    pub fn create_employee(&self, request: EmployeeRequest) -> Result<EmployeeResponse, Fault> {
        crate::log_directory!(
            Level::INFO,
            "createEmployee - name: {:?}, email: {:?}, position: {:?}, companyId: {:?}",
            request.name,
            request.email,
            request.position,
            request.company_id
        );
        let name = required_name(request.name)?;

        let mut state = self.state.write();
        if let Some(company_id) = request.company_id {
            state.company(company_id)?;
        }

        state.next_employee_id += 1;
        let now = OffsetDateTime::now_utc();
        let employee = Employee {
            id: state.next_employee_id,
            name,
            email: request.email,
            position: request.position,
            company_id: request.company_id,
            created_at: now,
            updated_at: now,
        };
        let response = state.employee_response(&employee);
        state.employees.insert(employee.id, employee);
        Ok(response)
    }

    pub fn get_employee(&self, id: u64) -> Result<EmployeeResponse, Fault> {
        crate::log_directory!(Level::INFO, "getEmployee - id: {}", id);
        let state = self.state.read();
        let employee = state.employee(id)?;
        Ok(state.employee_response(employee))
    }

    /// All employees, or only those of `company_id`
    pub fn list_employees(&self, company_id: Option<u64>) -> Vec<EmployeeResponse> {
        match company_id {
            Some(id) => crate::log_directory!(Level::INFO, "getEmployeesByCompany - companyId: {}", id),
            None => crate::log_directory!(Level::INFO, "getAllEmployees"),
        }
        let state = self.state.read();
        state
            .employees
            .values()
            .filter(|e| company_id.map_or(true, |id| e.company_id == Some(id)))
            .map(|e| state.employee_response(e))
            .collect()
    }

    /// Update fields; a given `companyId` moves the employee to that company
    pub fn update_employee(&self, id: u64, request: EmployeeRequest) -> Result<EmployeeResponse, Fault> {
        crate::log_directory!(
            Level::INFO,
            "updateEmployee - id: {}, name: {:?}, email: {:?}, position: {:?}, companyId: {:?}",
            id,
            request.name,
            request.email,
            request.position,
            request.company_id
        );
        let mut state = self.state.write();
        state.employee(id)?;
        let name = required_name(request.name)?;
        if let Some(company_id) = request.company_id {
            state.company(company_id)?;
        }

        let employee = state
            .employees
            .get_mut(&id)
            .ok_or_else(|| Fault::not_found("Employee", id))?;
        employee.name = name;
        employee.email = request.email;
        employee.position = request.position;
        if request.company_id.is_some() {
            employee.company_id = request.company_id;
        }
        employee.updated_at = OffsetDateTime::now_utc();

        let employee = employee.clone();
        Ok(state.employee_response(&employee))
    }

    pub fn delete_employee(&self, id: u64) -> Result<(), Fault> {
        crate::log_directory!(Level::INFO, "deleteEmployee - id: {}", id);
        self.state
            .write()
            .employees
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Fault::not_found("Employee", id))
    }
}
