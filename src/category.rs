//! Category tree lookups and the flat `categoryLevel<N>` selection model used by
//! the wizard form.
//!
//! A selection is stored as one form value per level. Writing a level clears
//! every deeper level, so a stored selection is always a prefix path.

use serde_json::{Map, Value};
use tracing::warn;

use crate::entities::CategoryNode;

/// State of the deepest selected category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryLookup {
    Unselected,
    HasChildren,
    Leaf,
    /// A selected id does not exist at its level, usually a stale selection
    /// after the hosted tree changed.
    Missing { level: usize },
}

impl CategoryLookup {
    /// Whether the user has drilled as far as the tree allows. `Missing` counts
    /// as terminal so a stale selection doesn't block the rest of the wizard.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Leaf | Self::Missing { .. })
    }
}

pub fn category_level_key(prefix: &str, level: usize) -> String {
    format!("{prefix}{level}")
}

/// Level number of a `categoryLevel<N>` key. The whole numeric suffix is
/// parsed, so levels past 9 work.
pub fn parse_category_level(prefix: &str, key: &str) -> Option<usize> {
    key.strip_prefix(prefix)?
        .parse()
        .ok()
        .filter(|level| *level > 0)
}

pub fn find_category_by_id<'a>(categories: &'a [CategoryNode], id: &str) -> Option<&'a CategoryNode> {
    for category in categories {
        if category.id == id {
            return Some(category);
        }
        if let Some(found) = find_category_by_id(&category.subcategories, id) {
            return Some(found);
        }
    }
    None
}

pub fn category_depth(categories: &[CategoryNode]) -> usize {
    categories
        .iter()
        .map(|category| 1 + category_depth(&category.subcategories))
        .max()
        .unwrap_or(0)
}

/// Selected ids for levels 1.., stopping at the first unset level.
pub fn selected_path(fields: &Map<String, Value>, prefix: &str) -> Vec<String> {
    (1..)
        .map_while(|level| {
            fields
                .get(&category_level_key(prefix, level))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .collect()
}

/// Options offered at `level` (1-based) given the ids selected above it. A
/// parent id that doesn't exist at its level yields no options.
pub fn subcategories_for_level<'a>(
    categories: &'a [CategoryNode],
    path: &[String],
    level: usize,
) -> &'a [CategoryNode] {
    if level <= 1 {
        return categories;
    }
    let Some(parent_id) = path.get(level - 2) else {
        return &[];
    };
    let options = subcategories_for_level(categories, path, level - 1);
    options
        .iter()
        .find(|category| &category.id == parent_id)
        .map_or(&[][..], |category| category.subcategories.as_slice())
}

/// Walks the selected path down the tree and reports where it ends.
pub fn lookup_selection(categories: &[CategoryNode], path: &[String]) -> CategoryLookup {
    let mut options = categories;
    let mut lookup = CategoryLookup::Unselected;
    for (index, id) in path.iter().enumerate() {
        let Some(category) = options.iter().find(|category| &category.id == id) else {
            let level = index + 1;
            warn!(level, %id, "selected category not found in category tree");
            return CategoryLookup::Missing { level };
        };
        options = &category.subcategories;
        lookup = if options.is_empty() {
            CategoryLookup::Leaf
        } else {
            CategoryLookup::HasChildren
        };
    }
    lookup
}

/// Picks the `categoryLevel<N>` values that form a valid path through the
/// tree. A value is kept when it is set; descent continues only while the
/// selected node exists and has subcategories.
pub fn pick_category_fields(
    fields: &Map<String, Value>,
    prefix: &str,
    categories: &[CategoryNode],
) -> Map<String, Value> {
    let mut picked = Map::new();
    let mut options = categories;
    for level in 1.. {
        let key = category_level_key(prefix, level);
        let Some(value) = fields.get(&key).filter(|value| !value.is_null()) else {
            break;
        };
        picked.insert(key, value.clone());

        let subcategories = value
            .as_str()
            .and_then(|id| options.iter().find(|category| category.id == id))
            .map(|category| category.subcategories.as_slice())
            .unwrap_or_default();
        if subcategories.is_empty() {
            break;
        }
        options = subcategories;
    }
    picked
}

/// Writes the selection for `level` and clears all deeper levels. `None`
/// clears the level itself too.
pub fn select_category_level(
    fields: &mut Map<String, Value>,
    prefix: &str,
    level: usize,
    id: Option<&str>,
) {
    fields.retain(|key, _| parse_category_level(prefix, key).map_or(true, |l| l < level));
    if let Some(id) = id {
        fields.insert(
            category_level_key(prefix, level),
            Value::String(id.to_string()),
        );
    }
}

pub fn deepest_selected_level(fields: &Map<String, Value>, prefix: &str) -> usize {
    fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .filter_map(|(key, _)| parse_category_level(prefix, key))
        .max()
        .unwrap_or(0)
}
