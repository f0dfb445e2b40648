// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::{Category, CategoryType};
use rusqlite::Connection;
use std::collections::HashMap;
use std::str::FromStr;

pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// The category tree, held as an index-based arena (id -> slot) so that
/// parent links are plain ids rather than references.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    nodes: Vec<Category>,
    by_id: HashMap<i64, usize>,
    fallback: i64,
}

impl Taxonomy {
    pub fn load(conn: &Connection) -> Result<Taxonomy, LedgerError> {
        let mut stmt = conn.prepare(
            "SELECT id, name, parent_id, category_type, is_shared FROM categories ORDER BY id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<i64>>(2)?,
                r.get::<_, Option<String>>(3)?,
                r.get::<_, bool>(4)?,
            ))
        })?;
        let mut cats = Vec::new();
        for row in rows {
            let (id, name, parent_id, ctype, is_shared) = row?;
            let category_type = match ctype {
                Some(s) => Some(
                    CategoryType::from_str(&s).map_err(LedgerError::InvalidInput)?,
                ),
                None => None,
            };
            cats.push(Category {
                id,
                name,
                parent_id,
                category_type,
                is_shared,
            });
        }
        Taxonomy::from_categories(cats)
    }

    pub fn from_categories(cats: Vec<Category>) -> Result<Taxonomy, LedgerError> {
        if cats.is_empty() {
            return Err(LedgerError::EmptyTaxonomy);
        }
        let mut by_id = HashMap::with_capacity(cats.len());
        for (i, c) in cats.iter().enumerate() {
            if by_id.insert(c.id, i).is_some() {
                return Err(LedgerError::InvalidInput(format!(
                    "Duplicate category id {}",
                    c.id
                )));
            }
        }
        let fallback = cats
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(FALLBACK_CATEGORY))
            .map(|c| c.id)
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!(
                    "Taxonomy has no '{}' fallback category",
                    FALLBACK_CATEGORY
                ))
            })?;
        let taxonomy = Taxonomy {
            nodes: cats,
            by_id,
            fallback,
        };
        // Parent links must resolve and must not form cycles.
        for c in &taxonomy.nodes {
            let mut cursor = c.parent_id;
            let mut steps = 0usize;
            while let Some(pid) = cursor {
                let parent = taxonomy.get(pid).ok_or_else(|| {
                    LedgerError::InvalidInput(format!(
                        "Category '{}' references missing parent {}",
                        c.name, pid
                    ))
                })?;
                steps += 1;
                if steps > taxonomy.nodes.len() {
                    return Err(LedgerError::InvalidInput(format!(
                        "Cycle in category parent links at '{}'",
                        c.name
                    )));
                }
                cursor = parent.parent_id;
            }
        }
        Ok(taxonomy)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.by_id.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn fallback(&self) -> i64 {
        self.fallback
    }

    /// Ancestor ids from the immediate parent up to the root.
    pub fn ancestors(&self, id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(|c| c.parent_id);
        while let Some(pid) = cursor {
            out.push(pid);
            cursor = self.get(pid).and_then(|c| c.parent_id);
        }
        out
    }

    /// The category's own type, or the nearest ancestor's if unset.
    /// An explicitly set type always wins over inheritance.
    pub fn effective_type(&self, id: i64) -> Option<CategoryType> {
        let cat = self.get(id)?;
        if let Some(t) = cat.category_type {
            return Some(t);
        }
        for pid in self.ancestors(id) {
            if let Some(t) = self.get(pid).and_then(|c| c.category_type) {
                return Some(t);
            }
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.nodes.iter()
    }
}
