use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// Employee record as stored in the remote collection.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub photo: Option<Photo>,
}

impl Employee {
    /// Copy every field except the identifier from `other`.
    pub fn merge_details(&mut self, other: &Employee) {
        self.first_name = other.first_name.clone();
        self.last_name = other.last_name.clone();
        self.email = other.email.clone();
        self.position = other.position.clone();
        self.photo = other.photo.clone();
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// Collections seeded by hand often carry numeric ids.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Opaque reference to a locally selected photo file.
///
/// Only the reference travels to the record store, never the image bytes, so
/// a photo read back from the store is not usable as file data.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Photo(Value);

impl Photo {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self(json!({
            "name": name,
            "path": path.display().to_string(),
        }))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Path of the selected file, valid for the current session only.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.0.get("path").and_then(Value::as_str).map(PathBuf::from)
    }
}

/// Required text inputs of the employee form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    FirstName,
    LastName,
    Email,
    Position,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Id,
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::Position,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Id => "Employee ID",
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Email => "Email",
            Field::Position => "Position",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown field `{}` (expected id, first-name, last-name, email or position)",
            self.0
        )
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "id" | "employeeid" => Ok(Field::Id),
            "firstname" | "first" => Ok(Field::FirstName),
            "lastname" | "last" => Ok(Field::LastName),
            "email" => Ok(Field::Email),
            "position" => Ok(Field::Position),
            _ => Err(UnknownField(raw.to_string())),
        }
    }
}

/// Current values of the add/edit form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeeForm {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub photo: Option<Photo>,
}

impl EmployeeForm {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Id => &self.id,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::Position => &self.position,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::Position => &mut self.position,
        };
        *slot = value.into();
    }

    /// Required fields that are still empty, in form order.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }

    /// Build a record from the form, or report which fields are empty.
    pub fn to_record(&self) -> Result<Employee, Vec<Field>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(Employee {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            position: self.position.clone(),
            photo: self.photo.clone(),
        })
    }

    pub fn fill_from(&mut self, employee: &Employee) {
        *self = Self {
            id: employee.id.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            position: employee.position.clone(),
            photo: employee.photo.clone(),
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
