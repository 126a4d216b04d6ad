//! HR vertical slice: the employee roster form.
//!
//! [`RosterController`] holds the roster loaded from the record store along
//! with the add/edit form, and reconciles local state after every call.

mod controller;
mod employee;

pub use controller::{FormError, Notice, RosterController};
pub use employee::{Employee, EmployeeForm, Field, Photo, UnknownField};

/// Name of the remote collection employee records live in.
pub const EMPLOYEES_COLLECTION: &str = "employees";
