// ── Table pipeline ──
//
// search → filter → sort → paginate, as one pure function of
// (items, configuration, query). Never touches the store and never
// blocks on I/O; the store re-runs it after every mutation.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::config::{
    CrudConfig, FilterKind, SortDirection, SortSpec, is_active_filter_value,
};
use crate::model::{Entity, Value};

/// Everything the pipeline needs besides the items and the config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search_term: String,
    /// Filter key → raw filter value (`all`/empty mean inactive).
    pub filters: IndexMap<String, String>,
    pub sort: Option<SortSpec>,
    /// 1-indexed; 0 is read as 1.
    pub page: usize,
    /// 0 means "everything on one page".
    pub page_size: usize,
}

/// One derived page plus the metadata to paginate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub items: Vec<Entity>,
    /// Matches across all pages.
    pub total_count: usize,
    /// Always at least 1.
    pub total_pages: usize,
    /// The page actually shown (after the 0 → 1 adjustment).
    pub page: usize,
}

/// Derive the visible page.
pub fn derive(items: &[Entity], config: &CrudConfig, query: &Query) -> PageView {
    let mut matched = matching(items, config, query);
    if let Some(ref sort) = query.sort {
        sort_entities(&mut matched, sort);
    }

    let total_count = matched.len();
    let page = query.page.max(1);

    if query.page_size == 0 {
        return PageView {
            items: matched.into_iter().cloned().collect(),
            total_count,
            total_pages: 1,
            page,
        };
    }

    let total_pages = total_count.div_ceil(query.page_size).max(1);
    let start = (page - 1).saturating_mul(query.page_size);
    let items = matched
        .into_iter()
        .skip(start)
        .take(query.page_size)
        .cloned()
        .collect();

    PageView {
        items,
        total_count,
        total_pages,
        page,
    }
}

/// Entities passing search and filters, in input order.
pub fn matching<'a>(items: &'a [Entity], config: &CrudConfig, query: &Query) -> Vec<&'a Entity> {
    let term = query.search_term.to_lowercase();
    let active: Vec<(&str, &str)> = query
        .filters
        .iter()
        .filter(|(_, value)| is_active_filter_value(value))
        .map(|(key, value)| (key.as_str(), value.trim()))
        .collect();

    items
        .iter()
        .filter(|entity| matches_search(entity, &config.search_fields, &term))
        .filter(|entity| {
            active.iter().all(|(key, value)| {
                let kind = config.filter(key).map_or(FilterKind::Text, |f| f.kind);
                matches_filter(entity.get(key), kind, value)
            })
        })
        .collect()
}

// ── Search & filter ──────────────────────────────────────────────────

fn matches_search(entity: &Entity, search_fields: &[String], term: &str) -> bool {
    if term.is_empty() || search_fields.is_empty() {
        return true;
    }
    search_fields.iter().any(|key| {
        entity
            .get(key)
            .is_some_and(|v| v.search_text().contains(term))
    })
}

fn matches_filter(value: Option<&Value>, kind: FilterKind, wanted: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    match kind {
        FilterKind::Boolean => match (parse_bool(wanted), as_bool(value)) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => false,
        },
        FilterKind::Select => value.to_string().eq_ignore_ascii_case(wanted),
        FilterKind::Text => value.search_text().contains(&wanted.to_lowercase()),
        FilterKind::Date => value.search_text().starts_with(&wanted.to_lowercase()),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Text(s) => parse_bool(s.trim()),
        _ => None,
    }
}

// ── Sort ─────────────────────────────────────────────────────────────

fn sort_entities(entities: &mut [&Entity], sort: &SortSpec) {
    let key = sort.key.as_str();
    merge_sort(entities, &mut |a: &&Entity, b: &&Entity| {
        let ordering = compare_by(a, b, key);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Natural ordering of one attribute. Missing, null and mixed-kind
/// values compare as equal. `id` falls back to the entity id.
fn compare_by(a: &Entity, b: &Entity, key: &str) -> Ordering {
    match (a.get(key), b.get(key)) {
        (Some(x), Some(y)) => x.natural_cmp(y).unwrap_or(Ordering::Equal),
        (None, None) if key == "id" => a.id.cmp(&b.id),
        _ => Ordering::Equal,
    }
}

/// Stable top-down merge sort.
///
/// The comparator above is not a total order, and `slice::sort_by` may
/// panic on those. Merging only ever takes from the right run on a strict
/// `Less`, so equal elements keep their input order.
fn merge_sort<T: Copy>(items: &mut [T], cmp: &mut impl FnMut(&T, &T) -> Ordering) {
    let len = items.len();
    if len <= 1 {
        return;
    }
    let mid = len / 2;
    merge_sort(&mut items[..mid], cmp);
    merge_sort(&mut items[mid..], cmp);

    let mut merged = Vec::with_capacity(len);
    let (mut i, mut j) = (0, mid);
    while i < mid && j < len {
        if cmp(&items[j], &items[i]) == Ordering::Less {
            merged.push(items[j]);
            j += 1;
        } else {
            merged.push(items[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&items[i..mid]);
    merged.extend_from_slice(&items[j..]);
    items.copy_from_slice(&merged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterDescriptor, SelectOption};
    use pretty_assertions::assert_eq;

    fn config() -> CrudConfig {
        CrudConfig::new("Product", "Products", "products")
            .with_search_fields(["name", "description"])
            .with_filter(
                FilterDescriptor::new("category", "Category", FilterKind::Select)
                    .options([SelectOption::new("tools", "Tools")]),
            )
            .with_filter(FilterDescriptor::new("featured", "Featured", FilterKind::Boolean))
            .with_filter(FilterDescriptor::new("launched", "Launched", FilterKind::Date))
    }

    fn products() -> Vec<Entity> {
        vec![
            Entity::new("1").with("name", "Bravo").with("price", 30_i64),
            Entity::new("2").with("name", "Alpha").with("price", 10_i64),
            Entity::new("3").with("name", "Charlie").with("price", 20_i64),
        ]
    }

    fn ids(view: &PageView) -> Vec<&str> {
        view.items.iter().map(|e| e.id.as_str()).collect()
    }

    fn query() -> Query {
        Query {
            page: 1,
            page_size: 10,
            ..Query::default()
        }
    }

    fn sorted(key: &str, direction: SortDirection) -> Query {
        Query {
            sort: Some(SortSpec::new(key, direction)),
            ..query()
        }
    }

    #[test]
    fn sorts_by_name_ascending() {
        let view = derive(&products(), &config(), &sorted("name", SortDirection::Asc));
        assert_eq!(ids(&view), vec!["2", "1", "3"]);
    }

    #[test]
    fn sorts_by_price_descending() {
        let view = derive(&products(), &config(), &sorted("price", SortDirection::Desc));
        assert_eq!(ids(&view), vec!["1", "3", "2"]);
    }

    #[test]
    fn reversing_direction_reverses_distinct_keys() {
        let asc = derive(&products(), &config(), &sorted("price", SortDirection::Asc));
        let desc = derive(&products(), &config(), &sorted("price", SortDirection::Desc));
        let mut reversed = ids(&asc);
        reversed.reverse();
        assert_eq!(reversed, ids(&desc));
    }

    #[test]
    fn missing_sort_values_compare_equal_and_keep_order() {
        let items = vec![
            Entity::new("a").with("price", 20_i64),
            Entity::new("b"),
            Entity::new("c").with("price", 10_i64),
            Entity::new("d").with("price", "n/a"),
        ];
        // b and d tie with everything. Merging takes from the right run only
        // on a strict Less, so c (10 < 20) overtakes a and b, while b and d
        // never move ahead of anything to their left.
        let view = derive(&items, &config(), &sorted("price", SortDirection::Asc));
        assert_eq!(ids(&view), vec!["c", "a", "b", "d"]);

        let none_comparable = vec![Entity::new("x"), Entity::new("y"), Entity::new("z")];
        let view = derive(&none_comparable, &config(), &sorted("price", SortDirection::Desc));
        assert_eq!(ids(&view), vec!["x", "y", "z"]);
    }

    #[test]
    fn equal_keys_around_a_missing_value_stay_in_input_order() {
        let items = vec![
            Entity::new("p").with("price", 5_i64),
            Entity::new("q"),
            Entity::new("r").with("price", 5_i64),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let view = derive(&items, &config(), &sorted("price", direction));
            assert_eq!(ids(&view), vec!["p", "q", "r"]);
        }
    }

    #[test]
    fn whitespace_only_term_still_filters() {
        let items = vec![
            Entity::new("1").with("name", "a b"),
            Entity::new("2").with("name", "ab"),
        ];
        let q = Query {
            search_term: " ".into(),
            ..query()
        };
        assert_eq!(ids(&derive(&items, &config(), &q)), vec!["1"]);
    }

    #[test]
    fn sort_by_id_without_attribute() {
        let view = derive(&products(), &config(), &sorted("id", SortDirection::Desc));
        assert_eq!(ids(&view), vec!["3", "2", "1"]);
    }

    #[test]
    fn paginates_five_items_by_two() {
        let items: Vec<Entity> = (1..=5).map(|i: i64| Entity::new(i)).collect();
        let mut q = Query {
            page_size: 2,
            ..query()
        };

        let first = derive(&items, &config(), &q);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_count, 5);

        q.page = 3;
        let last = derive(&items, &config(), &q);
        assert_eq!(ids(&last), vec!["5"]);

        q.page = 4;
        assert!(derive(&items, &config(), &q).items.is_empty());
    }

    #[test]
    fn page_zero_reads_as_one_and_zero_size_is_single_page() {
        let q = Query {
            page: 0,
            page_size: 0,
            ..query()
        };
        let view = derive(&products(), &config(), &q);
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.items.len(), 3);
    }

    #[test]
    fn empty_collection_has_one_page() {
        let view = derive(&[], &config(), &query());
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.total_count, 0);
    }

    #[test]
    fn search_is_case_insensitive_over_search_fields() {
        let q = Query {
            search_term: "ALP".into(),
            ..query()
        };
        assert_eq!(ids(&derive(&products(), &config(), &q)), vec!["2"]);

        // surrounding whitespace is part of the term
        let q = Query {
            search_term: "  ALP ".into(),
            ..query()
        };
        assert!(derive(&products(), &config(), &q).items.is_empty());

        // price is not a search field
        let q = Query {
            search_term: "30".into(),
            ..query()
        };
        assert!(derive(&products(), &config(), &q).items.is_empty());
    }

    #[test]
    fn empty_search_is_a_no_op() {
        let plain = derive(&products(), &config(), &query());
        let q = Query {
            search_term: "   ".into(),
            ..query()
        };
        assert_eq!(derive(&products(), &config(), &q), plain);
    }

    #[test]
    fn filters_by_kind() {
        let items = vec![
            Entity::new("1")
                .with("category", "Tools")
                .with("featured", true)
                .with("launched", Value::from(serde_json::json!("2024-03-15T10:00:00Z"))),
            Entity::new("2")
                .with("category", "toys")
                .with("featured", false)
                .with("launched", "2023-11-02"),
            Entity::new("3").with("category", "tools").with("featured", "true"),
        ];
        let with_filter = |key: &str, value: &str| Query {
            filters: IndexMap::from([(key.to_owned(), value.to_owned())]),
            ..query()
        };

        let view = derive(&items, &config(), &with_filter("category", "TOOLS"));
        assert_eq!(ids(&view), vec!["1", "3"]);

        let view = derive(&items, &config(), &with_filter("featured", "true"));
        assert_eq!(ids(&view), vec!["1", "3"]);

        let view = derive(&items, &config(), &with_filter("featured", "yes"));
        assert!(view.items.is_empty());

        let view = derive(&items, &config(), &with_filter("launched", "2024-03"));
        assert_eq!(ids(&view), vec!["1"]);

        // no descriptor: substring match
        let view = derive(&items, &config(), &with_filter("category", "all"));
        assert_eq!(view.items.len(), 3);
        let view = derive(&items, &config(), &with_filter("color", "red"));
        assert!(view.items.is_empty());
    }

    #[test]
    fn derive_is_idempotent() {
        let q = Query {
            search_term: "a".into(),
            sort: Some(SortSpec::new("price", SortDirection::Asc)),
            page: 1,
            page_size: 2,
            ..Query::default()
        };
        let once = derive(&products(), &config(), &q);
        let twice = derive(&products(), &config(), &q);
        assert_eq!(once, twice);
    }
}
