use std::sync::Arc;

use async_graphql::{
    Context, Enum, Error, ErrorExtensions, InputObject, Object, Schema, SimpleObject, Subscription,
    ID,
};
use chrono::{DateTime, Utc};
use directory_core::{
    filter::distinct_departments,
    today_utc,
    validation::{validate_employee_now, validate_field_now},
    Department, DirectoryStats, DirectoryView, Employee, EmployeeDraft, EmployeeField,
    EmployeeFilter, EmployeeId, FieldError, Submission,
};
use futures::{Stream, StreamExt};
use sea_orm::DatabaseConnection;
use tracing::{info_span, Instrument};

use crate::{
    auth::{
        authenticate_local, issue_token, register_local_user, AuthConfig, AuthError, CurrentUser,
        SESSION_COOKIE,
    },
    error::ApiError,
    sync::StoreSync,
};

pub type DirectorySchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub struct AppSchema(pub DirectorySchema);

pub fn build_schema(
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthConfig>,
    sync: Arc<StoreSync>,
) -> AppSchema {
    let schema = Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(db)
        .data(auth)
        .data(sync)
        .finish();
    AppSchema(schema)
}

/// SDL without any runtime data attached.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .finish()
        .sdl()
}

pub struct QueryRoot;
pub struct MutationRoot;
pub struct SubscriptionRoot;

#[Object]
impl QueryRoot {
    async fn directory(&self) -> DirectoryQuery {
        DirectoryQuery
    }
}

#[Object]
impl MutationRoot {
    async fn directory(&self) -> DirectoryMutation {
        DirectoryMutation
    }
}

#[derive(Default)]
pub struct DirectoryQuery;

#[derive(Default)]
pub struct DirectoryMutation;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum DirectoryField {
    #[graphql(name = "NAME")]
    Name,
    #[graphql(name = "EMAIL")]
    Email,
    #[graphql(name = "POSITION")]
    Position,
    #[graphql(name = "DEPARTMENT")]
    Department,
    #[graphql(name = "START_DATE")]
    StartDate,
}

impl From<DirectoryField> for EmployeeField {
    fn from(value: DirectoryField) -> Self {
        match value {
            DirectoryField::Name => EmployeeField::Name,
            DirectoryField::Email => EmployeeField::Email,
            DirectoryField::Position => EmployeeField::Position,
            DirectoryField::Department => EmployeeField::Department,
            DirectoryField::StartDate => EmployeeField::StartDate,
        }
    }
}

/// A single field's validation failure. `field` is the input's wire name.
#[derive(Clone, Debug, SimpleObject)]
pub struct FieldIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl From<&FieldError> for FieldIssue {
    fn from(error: &FieldError) -> Self {
        Self {
            field: error.field.as_str().to_string(),
            code: error.kind.as_str().to_string(),
            message: error.message.to_string(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeNode {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub start_date: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<Employee> for EmployeeNode {
    fn from(employee: Employee) -> Self {
        let body = employee.body;
        Self {
            id: ID(employee.id.to_string()),
            name: body.name,
            email: body.email,
            position: body.position,
            department: body.department,
            start_date: body.start_date,
            submitted_at: body.submitted_at,
        }
    }
}

#[derive(Clone, Copy, Debug, SimpleObject)]
pub struct StatsNode {
    pub total: i32,
    pub departments: i32,
    pub filtered: i32,
    pub new_this_year: i32,
}

impl From<DirectoryStats> for StatsNode {
    fn from(stats: DirectoryStats) -> Self {
        Self {
            total: count(stats.total),
            departments: count(stats.departments),
            filtered: count(stats.filtered),
            new_this_year: count(stats.new_this_year),
        }
    }
}

fn count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeList {
    pub items: Vec<EmployeeNode>,
    pub departments: Vec<String>,
    pub stats: StatsNode,
}

impl From<DirectoryView> for EmployeeList {
    fn from(view: DirectoryView) -> Self {
        Self {
            items: view.employees.into_iter().map(EmployeeNode::from).collect(),
            departments: view.departments,
            stats: view.stats.into(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct UserNode {
    pub id: ID,
    pub email: String,
    pub display_name: String,
}

impl From<CurrentUser> for UserNode {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: ID(user.user_id.to_string()),
            email: user.email,
            display_name: user.display_name,
        }
    }
}

#[derive(Clone, Debug, SimpleObject, Default)]
pub struct AuthPayload {
    pub ok: bool,
    pub token: Option<String>,
    pub user: Option<UserNode>,
    pub error: Option<String>,
}

impl AuthPayload {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, SimpleObject, Default)]
pub struct EmployeePayload {
    pub ok: bool,
    pub id: Option<ID>,
    pub errors: Vec<FieldIssue>,
}

#[derive(Clone, Debug, InputObject)]
pub struct EmployeeInput {
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub start_date: String,
}

impl From<EmployeeInput> for EmployeeDraft {
    fn from(input: EmployeeInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            position: input.position,
            department: input.department,
            start_date: input.start_date,
        }
    }
}

#[Object]
impl DirectoryQuery {
    async fn health(&self) -> &'static str {
        "ok"
    }

    /// The signed-in user, or null.
    async fn me(&self, ctx: &Context<'_>) -> Option<UserNode> {
        ctx.data_opt::<CurrentUser>().cloned().map(UserNode::from)
    }

    async fn employees(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        department: Option<String>,
    ) -> async_graphql::Result<EmployeeList> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        let filter = EmployeeFilter::new(search.unwrap_or_default(), department.unwrap_or_default());
        let span = info_span!(
            "directory.employees.list",
            has_search = !filter.search.is_empty(),
            department = filter.department.as_str()
        );
        let _guard = span.enter();
        let snapshot = sync.snapshot();
        Ok(DirectoryView::compute(&snapshot.employees(), &filter, today_utc()).into())
    }

    async fn employee(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<EmployeeNode>> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        Ok(sync
            .snapshot()
            .get(&EmployeeId::new(id.0))
            .map(EmployeeNode::from))
    }

    /// Departments present in the collection, first-seen order.
    async fn departments(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        Ok(distinct_departments(&sync.snapshot().employees()))
    }

    /// Every value the department field accepts.
    async fn department_choices(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        current_user(ctx)?;
        Ok(Department::ALL
            .iter()
            .map(|department| department.as_str().to_string())
            .collect())
    }

    async fn validate_field(
        &self,
        ctx: &Context<'_>,
        field: DirectoryField,
        value: String,
    ) -> async_graphql::Result<Option<FieldIssue>> {
        current_user(ctx)?;
        Ok(validate_field_now(field.into(), &value)
            .err()
            .map(|error| FieldIssue::from(&error)))
    }

    async fn validate_employee(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInput,
    ) -> async_graphql::Result<Vec<FieldIssue>> {
        current_user(ctx)?;
        let draft = EmployeeDraft::from(input);
        Ok(match validate_employee_now(&draft) {
            Ok(_) => vec![],
            Err(errors) => errors.iter().map(FieldIssue::from).collect(),
        })
    }
}

#[Object]
impl DirectoryMutation {
    async fn register(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
        display_name: Option<String>,
    ) -> async_graphql::Result<AuthPayload> {
        let auth = auth_config(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("directory.auth.register");
        let result = register_local_user(
            db.as_ref(),
            auth.as_ref(),
            &email,
            &password,
            display_name.as_deref(),
        )
        .instrument(span)
        .await;
        match result {
            Ok(model) => sign_in(ctx, &auth, CurrentUser::from(&model)),
            Err(err) => auth_failure(err),
        }
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> async_graphql::Result<AuthPayload> {
        let auth = auth_config(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("directory.auth.login");
        match authenticate_local(db.as_ref(), &email, &password)
            .instrument(span)
            .await
        {
            Ok(model) => sign_in(ctx, &auth, CurrentUser::from(&model)),
            Err(err) => auth_failure(err),
        }
    }

    async fn logout(&self, ctx: &Context<'_>) -> bool {
        append_session_cookie(ctx, "", -1);
        true
    }

    async fn create_employee(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInput,
    ) -> async_graphql::Result<EmployeePayload> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        let record = match validate_employee_now(&input.into()) {
            Ok(record) => record,
            Err(errors) => return Ok(rejected(errors.iter())),
        };
        let span = info_span!(
            "directory.employees.create",
            department = record.department.as_str()
        );
        let id = sync
            .apply(Submission::Create(record))
            .instrument(span)
            .await
            .map_err(api_error)?;
        Ok(accepted(id))
    }

    async fn update_employee(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: EmployeeInput,
    ) -> async_graphql::Result<EmployeePayload> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        let record = match validate_employee_now(&input.into()) {
            Ok(record) => record,
            Err(errors) => return Ok(rejected(errors.iter())),
        };
        let span = info_span!("directory.employees.update", employee_id = id.as_str());
        let id = sync
            .apply(Submission::Replace {
                id: EmployeeId::new(id.0),
                record,
            })
            .instrument(span)
            .await
            .map_err(api_error)?;
        Ok(accepted(id))
    }

    async fn delete_employee(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        let span = info_span!("directory.employees.delete", employee_id = id.as_str());
        sync.delete(&EmployeeId::new(id.0))
            .instrument(span)
            .await
            .map_err(api_error)?;
        Ok(true)
    }
}

#[Subscription]
impl SubscriptionRoot {
    /// Filtered view of every published snapshot, starting with the current one.
    async fn employees(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        department: Option<String>,
    ) -> async_graphql::Result<impl Stream<Item = EmployeeList>> {
        current_user(ctx)?;
        let sync = store_sync(ctx)?;
        let filter = EmployeeFilter::new(search.unwrap_or_default(), department.unwrap_or_default());
        Ok(sync.reader().into_stream().map(move |snapshot| {
            EmployeeList::from(DirectoryView::compute(
                &snapshot.employees(),
                &filter,
                today_utc(),
            ))
        }))
    }
}

fn accepted(id: EmployeeId) -> EmployeePayload {
    EmployeePayload {
        ok: true,
        id: Some(ID(id.to_string())),
        errors: vec![],
    }
}

fn rejected<'a>(errors: impl Iterator<Item = &'a FieldError>) -> EmployeePayload {
    EmployeePayload {
        ok: false,
        id: None,
        errors: errors.map(FieldIssue::from).collect(),
    }
}

fn sign_in(
    ctx: &Context<'_>,
    auth: &AuthConfig,
    user: CurrentUser,
) -> async_graphql::Result<AuthPayload> {
    let token = issue_token(&user, auth).map_err(|err| api_error(ApiError::internal(err)))?;
    append_session_cookie(ctx, &token, auth.session_ttl_minutes);
    Ok(AuthPayload {
        ok: true,
        token: Some(token),
        user: Some(user.into()),
        error: None,
    })
}

/// Credential and input problems go back in the payload; anything else is a
/// GraphQL error.
fn auth_failure(err: AuthError) -> async_graphql::Result<AuthPayload> {
    match ApiError::from(err) {
        ApiError::Validation(message) => Ok(AuthPayload::failed(message)),
        other => Err(other.extend()),
    }
}

fn database(ctx: &Context<'_>) -> async_graphql::Result<Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| api_error(ApiError::internal(anyhow::anyhow!("missing database connection"))))
}

fn auth_config(ctx: &Context<'_>) -> async_graphql::Result<Arc<AuthConfig>> {
    ctx.data::<Arc<AuthConfig>>()
        .cloned()
        .map_err(|_| api_error(ApiError::internal(anyhow::anyhow!("missing auth configuration"))))
}

fn store_sync(ctx: &Context<'_>) -> async_graphql::Result<Arc<StoreSync>> {
    ctx.data::<Arc<StoreSync>>()
        .cloned()
        .map_err(|_| api_error(ApiError::internal(anyhow::anyhow!("missing record store"))))
}

fn current_user(ctx: &Context<'_>) -> async_graphql::Result<CurrentUser> {
    ctx.data_opt::<CurrentUser>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthenticated.extend())
}

fn api_error(err: impl Into<ApiError>) -> Error {
    err.into().extend()
}

fn append_session_cookie(ctx: &Context<'_>, token: &str, ttl_minutes: i64) {
    let cookie = if ttl_minutes < 0 {
        format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE)
    } else {
        format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            token,
            ttl_minutes * 60
        )
    };
    ctx.append_http_header("Set-Cookie", cookie);
}
