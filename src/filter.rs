use crate::todo::{ArchivedTodo, Todo};

/// Anything with a primary line of text to match a search query against.
pub trait Searchable {
    fn primary_text(&self) -> Option<&str>;
}

impl Searchable for Todo {
    fn primary_text(&self) -> Option<&str> {
        self.question.as_deref()
    }
}

impl Searchable for ArchivedTodo {
    fn primary_text(&self) -> Option<&str> {
        self.question.as_deref()
    }
}

/// Keeps the items whose primary text contains `query`, ignoring case.
/// Items without text count as `""`. Input order is preserved.
pub fn filter<'a, T, I>(items: I, query: &str) -> Vec<&'a T>
where
    T: Searchable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let q = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            q.is_empty()
                || item
                    .primary_text()
                    .unwrap_or("")
                    .to_lowercase()
                    .contains(&q)
        })
        .collect()
}
