//! Books repository: renders a [`BookQueryPlan`] to PostgreSQL and resolves
//! the related collections of a page.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{
    plan::{BookQueryPlan, Field, Join, JoinKind, Predicate, Relation},
    BookStore,
};
use crate::{
    error::AppResult,
    models::{Author, Book, Bookshelf, Format, Language, Page, Subject},
};

/// Escape LIKE metacharacters so user input matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn column(field: Field) -> &'static str {
    match field {
        Field::BookTitle => "b.title",
        Field::AuthorName => "a.name",
        Field::SubjectName => "su.name",
        Field::BookshelfName => "bs.name",
        Field::LanguageCode => "l.code",
        Field::FormatMimeType => "f.mime_type",
    }
}

fn join_clause(join: &Join) -> String {
    let kw = match join.kind {
        JoinKind::Inner => "JOIN",
        JoinKind::Left => "LEFT JOIN",
    };
    match join.relation {
        Relation::Authors => format!(
            " {kw} books_book_authors ba ON ba.book_id = b.id {kw} books_author a ON a.id = ba.author_id"
        ),
        Relation::Subjects => format!(
            " {kw} books_book_subjects bsu ON bsu.book_id = b.id {kw} books_subject su ON su.id = bsu.subject_id"
        ),
        Relation::Bookshelves => format!(
            " {kw} books_book_bookshelves bbs ON bbs.book_id = b.id {kw} books_bookshelf bs ON bs.id = bbs.bookshelf_id"
        ),
        Relation::Languages => format!(
            " {kw} books_book_languages bl ON bl.book_id = b.id {kw} books_language l ON l.id = bl.language_id"
        ),
        Relation::Formats => format!(" {kw} books_format f ON f.book_id = b.id"),
    }
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Never => {
            qb.push("FALSE");
        }
        Predicate::IdIn(ids) => {
            qb.push("b.id = ANY(").push_bind(ids.clone()).push(")");
        }
        Predicate::Contains { field, needle } => {
            qb.push(column(*field))
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_like(needle)));
        }
        Predicate::OneOf { field, values } => {
            qb.push(column(*field))
                .push(" = ANY(")
                .push_bind(values.clone())
                .push(")");
        }
        Predicate::Any(alternatives) if alternatives.is_empty() => {
            qb.push("FALSE");
        }
        Predicate::Any(alternatives) => {
            qb.push("(");
            for (idx, alternative) in alternatives.iter().enumerate() {
                if idx > 0 {
                    qb.push(" OR ");
                }
                push_predicate(qb, alternative);
            }
            qb.push(")");
        }
    }
}

/// `FROM ... [JOIN ...] [WHERE ...]`, shared by the count and page queries
fn push_from_where(qb: &mut QueryBuilder<'_, Postgres>, plan: &BookQueryPlan) {
    qb.push(" FROM books_book b");
    for join in plan.joins() {
        qb.push(join_clause(join));
    }

    for (idx, predicate) in plan.predicates().iter().enumerate() {
        qb.push(if idx == 0 { " WHERE " } else { " AND " });
        push_predicate(qb, predicate);
    }
}

/// Distinct count of matching books
pub fn count_query(plan: &BookQueryPlan) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(DISTINCT b.id)");
    push_from_where(&mut qb, plan);
    qb
}

/// One page of distinct matching books, most downloaded first
pub fn page_query(plan: &BookQueryPlan, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(if plan.fans_out() {
        "SELECT DISTINCT b.id, b.title, b.download_count"
    } else {
        "SELECT b.id, b.title, b.download_count"
    });
    push_from_where(&mut qb, plan);
    qb.push(" ORDER BY b.download_count DESC NULLS LAST, b.id ASC");
    qb.push(" LIMIT ").push_bind(page.limit);
    qb.push(" OFFSET ").push_bind(page.offset);
    qb
}

const AUTHORS_SQL: &str = r#"
    SELECT ba.book_id, a.id, a.name
    FROM books_book_authors ba
    JOIN books_author a ON a.id = ba.author_id
    WHERE ba.book_id = ANY($1)
    ORDER BY ba.id
"#;

const SUBJECTS_SQL: &str = r#"
    SELECT bsu.book_id, su.id, su.name
    FROM books_book_subjects bsu
    JOIN books_subject su ON su.id = bsu.subject_id
    WHERE bsu.book_id = ANY($1)
    ORDER BY bsu.id
"#;

const BOOKSHELVES_SQL: &str = r#"
    SELECT bbs.book_id, bs.id, bs.name
    FROM books_book_bookshelves bbs
    JOIN books_bookshelf bs ON bs.id = bbs.bookshelf_id
    WHERE bbs.book_id = ANY($1)
    ORDER BY bbs.id
"#;

const LANGUAGES_SQL: &str = r#"
    SELECT bl.book_id, l.id, l.code
    FROM books_book_languages bl
    JOIN books_language l ON l.id = bl.language_id
    WHERE bl.book_id = ANY($1)
    ORDER BY bl.id
"#;

const FORMATS_SQL: &str = r#"
    SELECT id, mime_type, url, book_id
    FROM books_format
    WHERE book_id = ANY($1)
    ORDER BY id
"#;

/// `(book_id, entity_id, display value)` rows grouped by book
type Linked = HashMap<i32, Vec<(i32, Option<String>)>>;

/// Group link rows by book in link order. A book linked twice to the same
/// entity keeps only the first link.
fn group_linked(rows: Vec<(i32, i32, Option<String>)>) -> Linked {
    let mut linked = Linked::new();
    for (book_id, id, value) in rows {
        let entries = linked.entry(book_id).or_default();
        if entries.iter().all(|(seen, _)| *seen != id) {
            entries.push((id, value));
        }
    }
    linked
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn load_linked(&self, sql: &str, book_ids: &[i32]) -> AppResult<Linked> {
        let rows = sqlx::query_as::<_, (i32, i32, Option<String>)>(sql)
            .bind(book_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(group_linked(rows))
    }

    async fn load_formats(&self, book_ids: &[i32]) -> AppResult<HashMap<i32, Vec<Format>>> {
        let rows = sqlx::query_as::<_, Format>(FORMATS_SQL)
            .bind(book_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut formats: HashMap<i32, Vec<Format>> = HashMap::new();
        for format in rows {
            formats.entry(format.book_id).or_default().push(format);
        }
        Ok(formats)
    }

    /// Resolve all five collections for a page, whatever the filter was.
    async fn attach_relations(&self, books: &mut [Book]) -> AppResult<()> {
        if books.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();

        let (mut authors, mut subjects, mut bookshelves, mut languages, mut formats) = tokio::try_join!(
            self.load_linked(AUTHORS_SQL, &ids),
            self.load_linked(SUBJECTS_SQL, &ids),
            self.load_linked(BOOKSHELVES_SQL, &ids),
            self.load_linked(LANGUAGES_SQL, &ids),
            self.load_formats(&ids),
        )?;

        for book in books.iter_mut() {
            book.authors = take(&mut authors, book.id)
                .map(|(id, name)| Author { id, name })
                .collect();
            book.subjects = take(&mut subjects, book.id)
                .map(|(id, name)| Subject { id, name })
                .collect();
            book.bookshelves = take(&mut bookshelves, book.id)
                .map(|(id, name)| Bookshelf { id, name })
                .collect();
            book.languages = take(&mut languages, book.id)
                .map(|(id, code)| Language { id, code })
                .collect();
            book.formats = formats.remove(&book.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn take(linked: &mut Linked, book_id: i32) -> impl Iterator<Item = (i32, Option<String>)> {
    linked.remove(&book_id).unwrap_or_default().into_iter()
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn count_books(&self, plan: &BookQueryPlan) -> AppResult<i64> {
        let total: i64 = count_query(plan)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn fetch_books(&self, plan: &BookQueryPlan, page: Page) -> AppResult<Vec<Book>> {
        let mut books = page_query(plan, page)
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_relations(&mut books).await?;
        Ok(books)
    }
}
