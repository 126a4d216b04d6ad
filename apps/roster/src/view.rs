//! Plain-text rendering of the roster form.

use std::path::Path;

use products_hr::{Employee, EmployeeForm, Field};

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "tif", "tiff", "ico", "avif", "heic",
];

/// File-type filter of the photo picker: images only.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// One line per employee, in roster order.
pub fn roster_lines(roster: &[Employee]) -> Vec<String> {
    roster
        .iter()
        .map(|emp| {
            format!(
                "[{}] {} {} - {}",
                emp.id, emp.first_name, emp.last_name, emp.position
            )
        })
        .collect()
}

pub fn employee_details(employee: &Employee) -> String {
    let photo = employee
        .photo
        .as_ref()
        .and_then(|photo| photo.file_name())
        .unwrap_or("(default avatar)");
    format!(
        "Employee Details\n  Photo: {photo}\n  ID: {}\n  First Name: {}\n  Last Name: {}\n  Email: {}\n  Position: {}",
        employee.id, employee.first_name, employee.last_name, employee.email, employee.position
    )
}

pub fn form_summary(form: &EmployeeForm, editing: bool) -> String {
    let title = if editing { "Edit Employee" } else { "Add Employee" };
    let mut lines = vec![title.to_string()];
    for field in Field::ALL {
        lines.push(format!("  {}: {}", field.label(), form.get(field)));
    }
    let photo = form
        .photo
        .as_ref()
        .and_then(|photo| photo.file_name())
        .unwrap_or("-");
    lines.push(format!("  Photo: {photo}"));
    lines.join("\n")
}
