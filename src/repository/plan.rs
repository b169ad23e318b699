//! Store-neutral query plan for catalog searches.
//!
//! A [`BookQueryPlan`] is the set of joins and predicates implied by a
//! [`BookFilter`]. Both the count query and the page query are rendered from
//! the same plan, so they always agree on which books match.

use crate::models::BookFilter;

/// A related collection reachable from `books_book`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    Authors,
    Subjects,
    Bookshelves,
    Languages,
    Formats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    /// Keeps books without any related row, needed when the relation is
    /// one alternative of an OR
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    pub relation: Relation,
    pub kind: JoinKind,
}

/// Column a predicate can test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BookTitle,
    AuthorName,
    SubjectName,
    BookshelfName,
    LanguageCode,
    FormatMimeType,
}

impl Field {
    /// Relation that must be joined before this field can be tested
    pub fn relation(self) -> Option<Relation> {
        match self {
            Field::BookTitle => None,
            Field::AuthorName => Some(Relation::Authors),
            Field::SubjectName => Some(Relation::Subjects),
            Field::BookshelfName => Some(Relation::Bookshelves),
            Field::LanguageCode => Some(Relation::Languages),
            Field::FormatMimeType => Some(Relation::Formats),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Always false
    Never,
    /// Book identity is a member of the set
    IdIn(Vec<i32>),
    /// Case-insensitive substring match
    Contains { field: Field, needle: String },
    /// Exact membership
    OneOf { field: Field, values: Vec<String> },
    /// Disjunction; empty is false
    Any(Vec<Predicate>),
}

/// Joins and conjunctive predicates for one catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQueryPlan {
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
}

impl BookQueryPlan {
    /// Build the plan for a filter.
    ///
    /// Every supplied category becomes one predicate (ANDed together); topic
    /// terms become a single OR over subject and bookshelf names. Relations
    /// are joined only when some predicate tests them, and at most once.
    pub fn from_filter(filter: &BookFilter) -> Self {
        let mut plan = Self::default();

        if let Some(ref ids) = filter.ids {
            if ids.is_empty() {
                plan.predicates.push(Predicate::Never);
            } else {
                plan.predicates.push(Predicate::IdIn(ids.clone()));
            }
        }

        if let Some(ref title) = filter.title_contains {
            plan.push(
                Predicate::Contains {
                    field: Field::BookTitle,
                    needle: title.clone(),
                },
                JoinKind::Inner,
            );
        }

        if let Some(ref author) = filter.author_contains {
            plan.push(
                Predicate::Contains {
                    field: Field::AuthorName,
                    needle: author.clone(),
                },
                JoinKind::Inner,
            );
        }

        if let Some(ref topics) = filter.topics {
            if topics.is_empty() {
                plan.predicates.push(Predicate::Never);
            } else {
                let alternatives = topics
                    .iter()
                    .flat_map(|topic| {
                        [Field::SubjectName, Field::BookshelfName].map(|field| Predicate::Contains {
                            field,
                            needle: topic.clone(),
                        })
                    })
                    .collect();
                plan.push(Predicate::Any(alternatives), JoinKind::Left);
            }
        }

        if let Some(ref languages) = filter.languages {
            plan.push_membership(Field::LanguageCode, languages);
        }

        if let Some(ref mime_types) = filter.mime_types {
            plan.push_membership(Field::FormatMimeType, mime_types);
        }

        plan
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when a join can yield several rows for one book
    pub fn fans_out(&self) -> bool {
        !self.joins.is_empty()
    }

    fn push_membership(&mut self, field: Field, values: &[String]) {
        if values.is_empty() {
            self.predicates.push(Predicate::Never);
        } else {
            self.push(
                Predicate::OneOf {
                    field,
                    values: values.to_vec(),
                },
                JoinKind::Inner,
            );
        }
    }

    fn push(&mut self, predicate: Predicate, kind: JoinKind) {
        let mut relations = Vec::new();
        predicate.collect_relations(&mut relations);
        for relation in relations {
            self.require(relation, kind);
        }
        self.predicates.push(predicate);
    }

    /// Add a join unless already present. An inner requirement wins over a
    /// left one since the predicate needing it must hold anyway.
    fn require(&mut self, relation: Relation, kind: JoinKind) {
        match self.joins.iter_mut().find(|j| j.relation == relation) {
            Some(existing) => {
                if kind == JoinKind::Inner {
                    existing.kind = JoinKind::Inner;
                }
            }
            None => self.joins.push(Join { relation, kind }),
        }
    }
}

impl Predicate {
    fn collect_relations(&self, out: &mut Vec<Relation>) {
        match self {
            Predicate::Never | Predicate::IdIn(_) => {}
            Predicate::Contains { field, .. } | Predicate::OneOf { field, .. } => {
                if let Some(relation) = field.relation() {
                    if !out.contains(&relation) {
                        out.push(relation);
                    }
                }
            }
            Predicate::Any(alternatives) => {
                for alternative in alternatives {
                    alternative.collect_relations(out);
                }
            }
        }
    }
}
