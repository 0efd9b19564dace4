//! Structured book records.

use super::{CliError, LocalCloud};
use cloudsave_client::{Book, RecordId, RecordStore, RemoteBackend, StatusReporter, StoreError};

/// Book fields as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct BookArgs {
    /// Record id, must be a non-negative integer.
    pub id: String,
    /// Title.
    pub title: String,
    /// ISBN.
    pub isbn: String,
    /// Authors in order.
    pub authors: Vec<String>,
    /// Delete the record after reading it back.
    pub delete: bool,
}

/// Saves a book, reads it back and optionally deletes it.
///
/// Returns what a final load sees: the book, or `None` after a delete.
pub async fn run(
    cloud: &LocalCloud,
    reporter: &StatusReporter,
    args: BookArgs,
) -> Result<Option<Book>, CliError> {
    let id: RecordId = match args.id.parse() {
        Ok(id) => id,
        Err(e) => {
            reporter.failure("Save book", &e);
            return Err(e.into());
        }
    };
    let books = cloud.records::<Book>();
    let key = books.record_key(id);

    let book = Book {
        id: id.get(),
        title: args.title,
        isbn: args.isbn,
        authors: args.authors,
    };
    let saved = books.save_record(id, &book).await;
    reporter.report("Save book", &saved, |_| format!("Book {} saved", key));
    saved?;

    let mut current = load(&books, reporter, id, &key).await?;

    if args.delete {
        let deleted = books.delete_record(id).await;
        reporter.report("Delete book", &deleted, |_| format!("Book {} deleted", key));
        deleted?;
        current = load(&books, reporter, id, &key).await?;
    }
    Ok(current)
}

async fn load<B: RemoteBackend>(
    books: &RecordStore<B, Book>,
    reporter: &StatusReporter,
    id: RecordId,
    key: &str,
) -> Result<Option<Book>, CliError> {
    match books.load_record(id).await {
        Ok(Some(book)) => {
            reporter.info(format!(
                "Loaded {}: '{}' ISBN {} by [{}]",
                key,
                book.title,
                book.isbn,
                book.authors.join(", ")
            ));
            Ok(Some(book))
        }
        Ok(None) => {
            reporter.failure("Load book", &StoreError::not_found(key));
            Ok(None)
        }
        Err(e) => {
            reporter.failure("Load book", &e);
            Err(e.into())
        }
    }
}
