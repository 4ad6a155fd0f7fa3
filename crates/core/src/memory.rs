//! In-memory implementation of the persistence ports.
//!
//! Mirrors the PostgreSQL schema's constraints: user deletes cascade, budget
//! deletes are restricted while expenses reference them, an expense may only
//! reference a budget of the same owner, and emails are unique.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pennywise_shared::types::{BudgetId, UserId};

use crate::auth::Credential;
use crate::budget::{Budget, BudgetDraft};
use crate::expense::{Expense, ExpenseDraft};
use crate::notification::{Notification, NotificationDraft};
use crate::resource::{Resource, Scope};
use crate::store::{Notice, ResourceStore, StoreError, StoreResult, UserStore};
use crate::user::{NewUser, StoredUser, User, UserChanges};

#[derive(Debug, Default)]
struct Sequences {
    users: i32,
    budgets: i32,
    expenses: i32,
    notifications: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct State {
    seq: Sequences,
    users: BTreeMap<i32, StoredUser>,
    budgets: BTreeMap<i32, Budget>,
    expenses: BTreeMap<i32, Expense>,
    notifications: BTreeMap<i32, Notification>,
}

impl State {
    fn require_user(&self, id: UserId) -> StoreResult<()> {
        if self.users.contains_key(&id.get()) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference(format!(
                "user {id} does not exist"
            )))
        }
    }

    fn push_notice(&mut self, user_id: UserId, notice: Notice) {
        let id = next(&mut self.seq.notifications);
        self.notifications.insert(
            id,
            Notification {
                id: id.into(),
                user_id,
                message: notice.message,
                is_read: false,
                created_at: notice.created_at,
                version: 1,
            },
        );
    }
}

/// Thread-safe in-memory store for tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

/// Table access and constraint hooks for one resource type.
trait MemoryRow: Resource {
    fn table(state: &State) -> &BTreeMap<i32, Self>;

    fn table_mut(state: &mut State) -> &mut BTreeMap<i32, Self>;

    fn next_id(state: &mut State) -> i32;

    fn build(id: i32, owner: UserId, draft: Self::Draft, created_at: DateTime<Utc>) -> Self;

    /// Overwrites the mutable fields and increments the version.
    fn apply(&mut self, draft: Self::Draft);

    fn check_references(_state: &State, _owner: UserId, _draft: &Self::Draft) -> StoreResult<()> {
        Ok(())
    }

    fn check_delete(_state: &State, _id: Self::Id) -> StoreResult<()> {
        Ok(())
    }
}

impl MemoryRow for Budget {
    fn table(state: &State) -> &BTreeMap<i32, Self> {
        &state.budgets
    }

    fn table_mut(state: &mut State) -> &mut BTreeMap<i32, Self> {
        &mut state.budgets
    }

    fn next_id(state: &mut State) -> i32 {
        next(&mut state.seq.budgets)
    }

    fn build(id: i32, owner: UserId, draft: BudgetDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: owner,
            category: draft.category,
            amount: draft.amount,
            month_year: draft.month_year,
            created_at,
            version: 1,
        }
    }

    fn apply(&mut self, draft: BudgetDraft) {
        self.category = draft.category;
        self.amount = draft.amount;
        self.month_year = draft.month_year;
        self.version += 1;
    }

    fn check_delete(state: &State, id: BudgetId) -> StoreResult<()> {
        if state.expenses.values().any(|e| e.budget_id == Some(id)) {
            return Err(StoreError::Restricted(
                "expenses still reference this budget".to_string(),
            ));
        }
        Ok(())
    }
}

impl MemoryRow for Expense {
    fn table(state: &State) -> &BTreeMap<i32, Self> {
        &state.expenses
    }

    fn table_mut(state: &mut State) -> &mut BTreeMap<i32, Self> {
        &mut state.expenses
    }

    fn next_id(state: &mut State) -> i32 {
        next(&mut state.seq.expenses)
    }

    fn build(id: i32, owner: UserId, draft: ExpenseDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: owner,
            budget_id: draft.budget_id,
            category: draft.category,
            amount: draft.amount,
            date: draft.date,
            description: draft.description,
            created_at,
            version: 1,
        }
    }

    fn apply(&mut self, draft: ExpenseDraft) {
        self.budget_id = draft.budget_id;
        self.category = draft.category;
        self.amount = draft.amount;
        self.date = draft.date;
        self.description = draft.description;
        self.version += 1;
    }

    fn check_references(state: &State, owner: UserId, draft: &ExpenseDraft) -> StoreResult<()> {
        let Some(budget_id) = draft.budget_id else {
            return Ok(());
        };
        match state.budgets.get(&budget_id.get()) {
            Some(budget) if budget.user_id == owner => Ok(()),
            _ => Err(StoreError::InvalidReference(format!(
                "budget {budget_id} does not exist for this user"
            ))),
        }
    }
}

impl MemoryRow for Notification {
    fn table(state: &State) -> &BTreeMap<i32, Self> {
        &state.notifications
    }

    fn table_mut(state: &mut State) -> &mut BTreeMap<i32, Self> {
        &mut state.notifications
    }

    fn next_id(state: &mut State) -> i32 {
        next(&mut state.seq.notifications)
    }

    fn build(
        id: i32,
        owner: UserId,
        draft: NotificationDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: owner,
            message: draft.message,
            is_read: draft.is_read,
            created_at,
            version: 1,
        }
    }

    fn apply(&mut self, draft: NotificationDraft) {
        self.message = draft.message;
        self.is_read = draft.is_read;
        self.version += 1;
    }
}

macro_rules! memory_resource_store {
    ($row:ty) => {
        #[async_trait]
        impl ResourceStore<$row> for MemoryStore {
            async fn list(&self, scope: Scope) -> StoreResult<Vec<$row>> {
                let state = self.lock()?;
                Ok(<$row>::table(&state)
                    .values()
                    .filter(|row| scope.permits(row.owner()))
                    .cloned()
                    .collect())
            }

            async fn find(
                &self,
                scope: Scope,
                id: <$row as Resource>::Id,
            ) -> StoreResult<Option<$row>> {
                let state = self.lock()?;
                let key: i32 = id.into();
                Ok(<$row>::table(&state)
                    .get(&key)
                    .filter(|row| scope.permits(row.owner()))
                    .cloned())
            }

            async fn insert(
                &self,
                owner: UserId,
                draft: <$row as Resource>::Draft,
                created_at: DateTime<Utc>,
            ) -> StoreResult<$row> {
                let mut state = self.lock()?;
                state.require_user(owner)?;
                <$row>::check_references(&state, owner, &draft)?;

                let id = <$row>::next_id(&mut state);
                let row = <$row>::build(id, owner, draft, created_at);
                <$row>::table_mut(&mut state).insert(id, row.clone());
                Ok(row)
            }

            async fn update(
                &self,
                scope: Scope,
                id: <$row as Resource>::Id,
                expected_version: i32,
                draft: <$row as Resource>::Draft,
            ) -> StoreResult<$row> {
                let mut state = self.lock()?;
                let key: i32 = id.into();
                let current = <$row>::table(&state)
                    .get(&key)
                    .filter(|row| scope.permits(row.owner()))
                    .ok_or(StoreError::NotFound)?;
                if current.version() != expected_version {
                    return Err(StoreError::Conflict);
                }
                let owner = current.owner();
                <$row>::check_references(&state, owner, &draft)?;

                let row = <$row>::table_mut(&mut state)
                    .get_mut(&key)
                    .ok_or(StoreError::NotFound)?;
                row.apply(draft);
                Ok(row.clone())
            }

            async fn delete(&self, scope: Scope, id: <$row as Resource>::Id) -> StoreResult<()> {
                let mut state = self.lock()?;
                let key: i32 = id.into();
                let visible = <$row>::table(&state)
                    .get(&key)
                    .is_some_and(|row| scope.permits(row.owner()));
                if !visible {
                    return Err(StoreError::NotFound);
                }
                <$row>::check_delete(&state, id)?;
                <$row>::table_mut(&mut state).remove(&key);
                Ok(())
            }
        }
    };
}

memory_resource_store!(Budget);
memory_resource_store!(Expense);
memory_resource_store!(Notification);

#[async_trait]
impl UserStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        let state = self.lock()?;
        Ok(state.users.values().map(|s| s.user.clone()).collect())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let state = self.lock()?;
        Ok(state.users.get(&id.get()).map(|s| s.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .find(|s| s.user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_stored(&self, id: UserId) -> StoreResult<Option<StoredUser>> {
        let state = self.lock()?;
        Ok(state.users.get(&id.get()).cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .any(|s| s.user.email.eq_ignore_ascii_case(email)))
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|s| s.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate(format!(
                "email {} is already registered",
                user.email
            )));
        }

        let id = next(&mut state.seq.users);
        let created = User {
            id: id.into(),
            email: user.email,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            gender: user.gender,
            created_at: user.created_at,
            version: 1,
        };
        state.users.insert(
            id,
            StoredUser {
                user: created.clone(),
                credential: user.credential,
            },
        );
        Ok(created)
    }

    async fn update(
        &self,
        id: UserId,
        expected_version: i32,
        changes: UserChanges,
        notice: Option<Notice>,
    ) -> StoreResult<User> {
        let mut state = self.lock()?;
        let current = state.users.get(&id.get()).ok_or(StoreError::NotFound)?;
        if current.user.version != expected_version {
            return Err(StoreError::Conflict);
        }
        let taken = state
            .users
            .values()
            .any(|s| s.user.id != id && s.user.email.eq_ignore_ascii_case(&changes.email));
        if taken {
            return Err(StoreError::Duplicate(format!(
                "email {} is already registered",
                changes.email
            )));
        }

        let stored = state.users.get_mut(&id.get()).ok_or(StoreError::NotFound)?;
        let user = &mut stored.user;
        user.email = changes.email;
        user.first_name = changes.first_name;
        user.last_name = changes.last_name;
        user.gender = changes.gender;
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.version += 1;
        let updated = user.clone();
        if let Some(credential) = changes.credential {
            stored.credential = credential;
        }

        if let Some(notice) = notice {
            state.push_notice(id, notice);
        }
        Ok(updated)
    }

    async fn set_credential(
        &self,
        id: UserId,
        credential: &Credential,
        notice: Option<Notice>,
    ) -> StoreResult<()> {
        let mut state = self.lock()?;
        let stored = state.users.get_mut(&id.get()).ok_or(StoreError::NotFound)?;
        stored.credential = credential.clone();
        if let Some(notice) = notice {
            state.push_notice(id, notice);
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.users.remove(&id.get()).is_none() {
            return Err(StoreError::NotFound);
        }
        state.budgets.retain(|_, b| b.user_id != id);
        state.expenses.retain(|_, e| e.user_id != id);
        state.notifications.retain(|_, n| n.user_id != id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
