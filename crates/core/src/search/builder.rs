//! Search query builder
//!
//! Turns [`SearchCriteria`] into a [`QueryDescription`] and [`PageRequest`].
//! Pure and synchronous; safe to call from any number of tasks.

use catalog_domain::SearchCriteria;

use super::query::{fields, Clause, PageRequest, QueryDescription, SortOrder};

/// Compose the filter conjunction and page window for `criteria`
///
/// - `published = true` is always present.
/// - Each present id set adds a "contains any of" clause.
/// - Launch year and rating add equality clauses.
/// - Terms add an OR of substring matches over title and description.
pub fn build(criteria: &SearchCriteria) -> (QueryDescription, PageRequest) {
    let filters = &criteria.filters;
    let mut query = QueryDescription::new().and(Clause::term(fields::PUBLISHED, true));

    let id_sets = [
        (fields::CATEGORIES, &filters.categories),
        (fields::GENRES, &filters.genres),
        (fields::CAST_MEMBERS, &filters.cast_members),
    ];
    for (field, ids) in id_sets {
        if let Some(ids) = ids.as_ref().filter(|ids| !ids.is_empty()) {
            query.push(Clause::terms(field, ids.iter().cloned()));
        }
    }

    if let Some(year) = filters.launched_at {
        query.push(Clause::term(fields::LAUNCHED_AT, year));
    }
    if let Some(rating) = filters.rating {
        query.push(Clause::term(fields::RATING, rating.name()));
    }

    if let Some(terms) = criteria.terms.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query.push(Clause::AnyOf {
            should: vec![
                Clause::contains(fields::TITLE, terms),
                Clause::contains(fields::DESCRIPTION, terms),
            ],
            minimum_should_match: 1,
        });
    }

    let sort = SortOrder { field: sort_field(&criteria.sort), direction: criteria.direction };
    (query, PageRequest::of(criteria.page, criteria.per_page, sort))
}

/// Map free-text fields to their keyword sub-field; pass others through
pub fn sort_field(field: &str) -> String {
    if fields::FREE_TEXT.contains(&field) {
        format!("{field}{}", fields::KEYWORD_SUFFIX)
    } else {
        field.to_string()
    }
}
