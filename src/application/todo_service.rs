use crate::application::{error::{TodoError, TodoResult}, validation::{validate_create, validate_update}};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{OrderExhausted, Todo, TodoId, UpdateTodo};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    /// Validates a raw create payload and stores it at the top of the list.
    async fn create(&self, payload: Value) -> TodoResult<Todo>;
    /// Looks a todo up, failing with `NotFound` when it doesn't exist.
    async fn get(&self, id: TodoId) -> TodoResult<Todo>;
    async fn list(&self) -> TodoResult<Vec<Todo>>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo>;
    async fn delete(&self, id: TodoId) -> TodoResult<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, payload: Value) -> TodoResult<Todo> {
        let input = validate_create(&payload)?;
        let todo = self.repo.create(input).await.map_err(|err| {
            if err.is::<OrderExhausted>() {
                TodoError::validation(err.to_string())
            } else {
                TodoError::Internal(err)
            }
        })?;
        tracing::debug!(id = %todo.id, order = todo.order, "todo created");
        Ok(todo)
    }

    async fn get(&self, id: TodoId) -> TodoResult<Todo> {
        self.repo.get(id).await?.ok_or(TodoError::NotFound)
    }

    async fn list(&self) -> TodoResult<Vec<Todo>> { Ok(self.repo.list().await?) }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        validate_update(&input)?;
        let todo = self.repo.update(id, input).await?.ok_or(TodoError::NotFound)?;
        tracing::debug!(id = %todo.id, order = todo.order, done = todo.is_done(), "todo updated");
        Ok(todo)
    }

    async fn delete(&self, id: TodoId) -> TodoResult<()> {
        if self.repo.delete(id.clone()).await? {
            tracing::debug!(%id, "todo deleted");
            Ok(())
        } else {
            Err(TodoError::NotFound)
        }
    }
}
