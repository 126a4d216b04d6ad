use std::{fmt, path::PathBuf};

use platform_api::{ApiError, RecordStore};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::employee::{Employee, EmployeeForm, Field, Photo};

#[derive(Debug, Error)]
pub enum FormError {
    #[error("please fill in all fields (missing: {})", field_list(.0))]
    Incomplete(Vec<Field>),
    #[error("employee service call failed")]
    Service(#[source] ApiError),
}

impl FormError {
    /// Whether the user should be told about this failure.
    ///
    /// Service failures only go to the log.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, FormError::Incomplete(_))
    }
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Confirmation shown to the user after a successful call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Added(String),
    Updated(String),
    Deleted(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Added(_) => f.write_str("Employee added successfully!"),
            Notice::Updated(_) => f.write_str("Employee updated successfully!"),
            Notice::Deleted(_) => f.write_str("Employee deleted successfully!"),
        }
    }
}

/// Owns the roster and the form, and keeps both in step with the record store.
pub struct RosterController<S> {
    store: S,
    roster: Vec<Employee>,
    form: EmployeeForm,
    search_input: String,
    search_result: Option<Employee>,
    editing: Option<String>,
}

impl<S> RosterController<S>
where
    S: RecordStore<Employee>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            roster: Vec::new(),
            form: EmployeeForm::default(),
            search_input: String::new(),
            search_result: None,
            editing: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn roster(&self) -> &[Employee] {
        &self.roster
    }

    pub fn form(&self) -> &EmployeeForm {
        &self.form
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn search_result(&self) -> Option<&Employee> {
        self.search_result.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Replace the roster with the store's contents.
    ///
    /// On failure the roster is left untouched.
    #[instrument(name = "roster.load", skip_all)]
    pub async fn load_roster(&mut self) -> Result<usize, FormError> {
        let employees = self
            .store
            .list()
            .await
            .map_err(|err| service_failure("load", err))?;
        self.roster = employees;
        info!(count = self.roster.len(), "roster loaded");
        Ok(self.roster.len())
    }

    /// Add a new employee, or update the one being edited.
    #[instrument(name = "roster.submit", skip_all, fields(editing = self.editing.is_some()))]
    pub async fn submit(&mut self) -> Result<Notice, FormError> {
        let record = self.form.to_record().map_err(FormError::Incomplete)?;

        let notice = match self.editing.clone() {
            Some(edit_id) => {
                // The body carries whatever the id field holds; the stored id never changes.
                self.store
                    .update(&edit_id, &record)
                    .await
                    .map_err(|err| service_failure("update", err))?;
                for entry in self.roster.iter_mut().filter(|entry| entry.id == edit_id) {
                    entry.merge_details(&record);
                }
                self.editing = None;
                info!(id = %edit_id, "employee updated");
                Notice::Updated(edit_id)
            }
            None => {
                self.store
                    .create(&record)
                    .await
                    .map_err(|err| service_failure("create", err))?;
                let id = record.id.clone();
                self.roster.push(record);
                info!(id = %id, "employee added");
                Notice::Added(id)
            }
        };

        self.form.clear();
        Ok(notice)
    }

    /// Load a roster entry into the form for editing. Unknown ids are ignored.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(employee) = self.roster.iter().find(|entry| entry.id == id) else {
            return false;
        };
        self.form.fill_from(employee);
        self.editing = Some(employee.id.clone());
        self.search_result = None;
        true
    }

    /// Look an id up in the loaded roster. Never touches the store.
    pub fn search(&mut self, id: impl Into<String>) -> Option<&Employee> {
        self.search_input = id.into();
        self.search_result = self
            .roster
            .iter()
            .find(|entry| entry.id == self.search_input)
            .cloned();
        self.search_result.as_ref()
    }

    #[instrument(name = "roster.delete", skip(self))]
    pub async fn delete(&mut self, id: &str) -> Result<Notice, FormError> {
        self.store
            .delete(id)
            .await
            .map_err(|err| service_failure("delete", err))?;
        self.roster.retain(|entry| entry.id != id);
        self.search_result = None;
        self.editing = None;
        info!(id = %id, "employee deleted");
        Ok(Notice::Deleted(id.to_string()))
    }

    /// Keep the first selected file as the form's photo.
    pub fn select_photo<I>(&mut self, files: I) -> Option<&Photo>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.form.photo = files.into_iter().next().map(Photo::from_path);
        self.form.photo.as_ref()
    }
}

fn service_failure(operation: &'static str, err: ApiError) -> FormError {
    error!(operation, code = err.code(), error = %err, "employee service call failed");
    FormError::Service(err)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;
    use platform_api::{ApiResult, Method, StatusCode};

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        List,
        Create(Employee),
        Update(String, Employee),
        Delete(String),
    }

    #[derive(Default)]
    struct MemoryStore {
        seed: Vec<Employee>,
        calls: Mutex<Vec<Call>>,
        failing: AtomicBool,
    }

    impl MemoryStore {
        fn seeded(seed: Vec<Employee>) -> Self {
            Self {
                seed,
                ..Self::default()
            }
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call, method: Method) -> ApiResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    method,
                    url: "memory://employees".into(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordStore<Employee> for MemoryStore {
        async fn list(&self) -> ApiResult<Vec<Employee>> {
            self.record(Call::List, Method::GET)?;
            Ok(self.seed.clone())
        }

        async fn create(&self, record: &Employee) -> ApiResult<()> {
            self.record(Call::Create(record.clone()), Method::POST)
        }

        async fn update(&self, id: &str, record: &Employee) -> ApiResult<()> {
            self.record(Call::Update(id.to_string(), record.clone()), Method::PUT)
        }

        async fn delete(&self, id: &str) -> ApiResult<()> {
            self.record(Call::Delete(id.to_string()), Method::DELETE)
        }
    }

    fn employee(id: &str, first: &str, last: &str, email: &str, position: &str) -> Employee {
        Employee {
            id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            position: position.into(),
            photo: None,
        }
    }

    fn ann() -> Employee {
        employee("1", "Ann", "Lee", "a@x.com", "Eng")
    }

    async fn loaded(seed: Vec<Employee>) -> RosterController<MemoryStore> {
        let mut controller = RosterController::new(MemoryStore::seeded(seed));
        controller.load_roster().await.unwrap();
        controller
    }

    fn fill(controller: &mut RosterController<MemoryStore>, employee: &Employee) {
        controller.set_field(Field::Id, employee.id.clone());
        controller.set_field(Field::FirstName, employee.first_name.clone());
        controller.set_field(Field::LastName, employee.last_name.clone());
        controller.set_field(Field::Email, employee.email.clone());
        controller.set_field(Field::Position, employee.position.clone());
    }

    #[tokio::test]
    async fn load_replaces_roster_wholesale() {
        let controller = loaded(vec![ann(), employee("2", "Bo", "Ng", "b@x.com", "Ops")]).await;
        assert_eq!(controller.roster().len(), 2);
        assert_eq!(controller.store().calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn failed_load_leaves_roster_empty() {
        let store = MemoryStore::seeded(vec![ann()]);
        store.fail(true);
        let mut controller = RosterController::new(store);
        let err = controller.load_roster().await.unwrap_err();
        assert!(matches!(err, FormError::Service(_)));
        assert!(!err.is_user_visible());
        assert!(controller.roster().is_empty());
    }

    #[tokio::test]
    async fn incomplete_form_makes_no_call() {
        let mut controller = loaded(vec![ann()]).await;
        controller.set_field(Field::Id, "2");
        controller.set_field(Field::FirstName, "Bo");

        let err = controller.submit().await.unwrap_err();
        match &err {
            FormError::Incomplete(missing) => {
                assert_eq!(missing, &vec![Field::LastName, Field::Email, Field::Position]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_user_visible());
        assert_eq!(
            err.to_string(),
            "please fill in all fields (missing: Last Name, Email, Position)"
        );
        assert_eq!(controller.store().calls(), vec![Call::List]);
        assert_eq!(controller.roster(), &[ann()]);
        assert_eq!(controller.form().first_name, "Bo");
    }

    #[tokio::test]
    async fn create_appends_record_and_clears_form() {
        let mut controller = loaded(vec![ann()]).await;
        let bo = employee("2", "Bo", "Ng", "b@x.com", "Ops");
        fill(&mut controller, &bo);
        controller.select_photo([PathBuf::from("/tmp/bo.jpg")]);

        let notice = controller.submit().await.unwrap();
        assert_eq!(notice, Notice::Added("2".into()));
        assert_eq!(notice.to_string(), "Employee added successfully!");

        let mut expected = bo.clone();
        expected.photo = Some(Photo::from_path("/tmp/bo.jpg"));
        assert_eq!(controller.roster().len(), 2);
        assert_eq!(controller.roster()[1], expected);
        assert_eq!(controller.store().calls()[1], Call::Create(expected));
        assert_eq!(controller.form(), &EmployeeForm::default());
        assert!(!controller.is_editing());
    }

    #[tokio::test]
    async fn create_does_not_check_for_duplicate_ids() {
        let mut controller = loaded(vec![ann()]).await;
        fill(&mut controller, &employee("1", "Al", "Ma", "al@x.com", "HR"));
        controller.submit().await.unwrap();
        assert_eq!(controller.roster().len(), 2);
        assert!(controller.roster().iter().all(|entry| entry.id == "1"));
    }

    #[tokio::test]
    async fn failed_create_keeps_form_and_roster() {
        let mut controller = loaded(vec![ann()]).await;
        let bo = employee("2", "Bo", "Ng", "b@x.com", "Ops");
        fill(&mut controller, &bo);
        controller.store().fail(true);

        let err = controller.submit().await.unwrap_err();
        assert!(matches!(err, FormError::Service(_)));
        assert_eq!(controller.roster(), &[ann()]);
        assert_eq!(controller.form().to_record().unwrap(), bo);
    }

    #[tokio::test]
    async fn search_only_consults_loaded_roster() {
        let mut controller = loaded(vec![ann()]).await;
        assert_eq!(controller.search("1"), Some(&ann()));
        assert_eq!(controller.search_result(), Some(&ann()));
        assert_eq!(controller.search("9"), None);
        assert!(controller.search_result().is_none());
        assert_eq!(controller.search_input(), "9");
        assert_eq!(controller.store().calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn begin_edit_populates_form_and_clears_search() {
        let mut controller = loaded(vec![ann()]).await;
        controller.search("1");

        assert!(controller.begin_edit("1"));
        assert!(controller.is_editing());
        assert_eq!(controller.editing_id(), Some("1"));
        assert_eq!(controller.form().to_record().unwrap(), ann());
        assert!(controller.search_result().is_none());
    }

    #[tokio::test]
    async fn begin_edit_unknown_id_is_a_no_op() {
        let mut controller = loaded(vec![ann()]).await;
        controller.search("1");
        controller.set_field(Field::FirstName, "draft");

        assert!(!controller.begin_edit("9"));
        assert!(!controller.is_editing());
        assert_eq!(controller.form().first_name, "draft");
        assert_eq!(controller.search_result(), Some(&ann()));
    }

    #[tokio::test]
    async fn update_ignores_identifier_edits() {
        let mut controller = loaded(vec![ann(), employee("3", "Cy", "Ro", "c@x.com", "QA")]).await;
        controller.begin_edit("1");
        controller.set_field(Field::FirstName, "Anna");
        controller.set_field(Field::Id, "2");

        let notice = controller.submit().await.unwrap();
        assert_eq!(notice, Notice::Updated("1".into()));

        assert_eq!(
            controller.roster()[0],
            employee("1", "Anna", "Lee", "a@x.com", "Eng")
        );
        assert_eq!(controller.roster()[1].first_name, "Cy");
        assert_eq!(
            controller.store().calls()[1],
            Call::Update("1".into(), employee("2", "Anna", "Lee", "a@x.com", "Eng"))
        );
        assert!(!controller.is_editing());
        assert_eq!(controller.editing_id(), None);
        assert_eq!(controller.form(), &EmployeeForm::default());
    }

    #[tokio::test]
    async fn update_merges_every_entry_sharing_the_id() {
        let cy = employee("3", "Cy", "Ro", "c@x.com", "QA");
        let twin = employee("1", "Al", "Ma", "al@x.com", "HR");
        let mut controller = loaded(vec![ann(), cy.clone(), twin]).await;
        assert!(controller.begin_edit("1"));
        controller.set_field(Field::Position, "Lead");

        controller.submit().await.unwrap();
        let updated = employee("1", "Ann", "Lee", "a@x.com", "Lead");
        assert_eq!(controller.roster(), &[updated.clone(), cy, updated]);
    }

    #[tokio::test]
    async fn delete_removes_every_entry_sharing_the_id() {
        let cy = employee("3", "Cy", "Ro", "c@x.com", "QA");
        let twin = employee("1", "Al", "Ma", "al@x.com", "HR");
        let mut controller = loaded(vec![ann(), cy.clone(), twin]).await;

        controller.delete("1").await.unwrap();
        assert_eq!(controller.roster(), &[cy]);
        assert_eq!(
            controller.store().calls(),
            vec![Call::List, Call::Delete("1".into())]
        );
    }

    #[tokio::test]
    async fn failed_update_stays_in_edit_mode() {
        let mut controller = loaded(vec![ann()]).await;
        controller.begin_edit("1");
        controller.set_field(Field::Position, "Lead");
        controller.store().fail(true);

        assert!(controller.submit().await.is_err());
        assert!(controller.is_editing());
        assert_eq!(controller.form().position, "Lead");
        assert_eq!(controller.roster(), &[ann()]);
    }

    #[tokio::test]
    async fn delete_removes_entry_and_resets_state() {
        let mut controller = loaded(vec![ann()]).await;
        controller.search("1");
        controller.begin_edit("1");
        controller.search("1");

        let notice = controller.delete("1").await.unwrap();
        assert_eq!(notice.to_string(), "Employee deleted successfully!");
        assert!(controller.roster().is_empty());
        assert!(controller.search_result().is_none());
        assert!(!controller.is_editing());
        assert_eq!(controller.store().calls()[1], Call::Delete("1".into()));
    }

    #[tokio::test]
    async fn delete_of_unrelated_id_still_exits_edit_mode() {
        let bo = employee("2", "Bo", "Ng", "b@x.com", "Ops");
        let mut controller = loaded(vec![ann(), bo.clone()]).await;
        controller.begin_edit("1");

        controller.delete("2").await.unwrap();
        assert_eq!(controller.roster(), &[ann()]);
        assert!(!controller.is_editing());
    }

    #[tokio::test]
    async fn failed_delete_keeps_roster() {
        let mut controller = loaded(vec![ann()]).await;
        controller.begin_edit("1");
        controller.store().fail(true);

        assert!(controller.delete("1").await.is_err());
        assert_eq!(controller.roster(), &[ann()]);
        assert!(controller.is_editing());
    }

    #[tokio::test]
    async fn select_photo_keeps_first_file_only() {
        let mut controller = RosterController::new(MemoryStore::default());
        let photo = controller
            .select_photo([PathBuf::from("/tmp/a.png"), PathBuf::from("/tmp/b.png")])
            .cloned();
        assert_eq!(photo.and_then(|p| p.file_name().map(str::to_string)), Some("a.png".into()));

        assert!(controller.select_photo(Vec::new()).is_none());
        assert!(controller.form().photo.is_none());
    }
}
