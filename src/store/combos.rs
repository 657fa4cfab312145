use std::collections::BTreeSet;

use chrono::Utc;

use super::{Store, StoreError, StoreResult, Tables, next_id};
use crate::models::{BookComboSummary, Combo, ComboDetails, ComboItem, ComboPatch, NewCombo};

impl Tables {
    /// Deduplicate ids, keeping first-seen order, and require each to be a live book.
    fn combo_items(&self, book_ids: &[u64]) -> StoreResult<Vec<ComboItem>> {
        let mut seen = BTreeSet::new();
        let unique: Vec<u64> = book_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if unique.is_empty() || unique.iter().any(|id| self.live_book(*id).is_none()) {
            return Err(StoreError::Invalid("Invalid book IDs".to_string()));
        }
        Ok(unique.into_iter().map(|book_id| ComboItem { book_id, is_hidden: false }).collect())
    }

    fn combo_details(&self, combo: &Combo) -> ComboDetails {
        let books = combo
            .items
            .iter()
            .filter(|item| !item.is_hidden)
            .filter_map(|item| self.live_book(item.book_id).cloned())
            .collect();
        ComboDetails {
            id: combo.id,
            title: combo.title.clone(),
            description: combo.description.clone(),
            created_by: combo.created_by,
            created_by_username: self.username_of(combo.created_by),
            books,
            created_at: combo.created_at,
            updated_at: combo.updated_at,
        }
    }

    fn combo_for_edit(&mut self, combo_id: u64, user_id: u64, is_admin: bool) -> StoreResult<&mut Combo> {
        let combo = self.combos.get_mut(&combo_id).ok_or(StoreError::NotFound("Combo"))?;
        if combo.created_by != user_id && !is_admin {
            return Err(StoreError::Forbidden(
                "You don't have permission to modify this combo".to_string(),
            ));
        }
        Ok(combo)
    }
}

impl Store {
    pub async fn create_combo(&self, created_by: u64, input: NewCombo) -> StoreResult<ComboDetails> {
        let mut tables = self.inner.write().await;
        let items = tables.combo_items(&input.book_ids)?;
        let now = Utc::now();
        let id = next_id(&mut tables.ids.combo);
        let combo = Combo {
            id,
            title: input.title.trim().to_string(),
            description: input.description,
            created_by,
            items,
            created_at: now,
            updated_at: now,
        };
        let details = tables.combo_details(&combo);
        tables.combos.insert(id, combo);
        Ok(details)
    }

    /// Apply a patch. Only the creator or an admin may edit a combo.
    pub async fn update_combo(
        &self,
        combo_id: u64,
        user_id: u64,
        is_admin: bool,
        patch: ComboPatch,
    ) -> StoreResult<ComboDetails> {
        let mut tables = self.inner.write().await;
        tables.combo_for_edit(combo_id, user_id, is_admin)?;
        let items = match &patch.book_ids {
            Some(ids) => Some(tables.combo_items(ids)?),
            None => None,
        };

        let combo = tables.combo_for_edit(combo_id, user_id, is_admin)?;
        if !patch.title.trim().is_empty() {
            combo.title = patch.title.trim().to_string();
        }
        if !patch.description.trim().is_empty() {
            combo.description = patch.description;
        }
        if let Some(items) = items {
            combo.items = items;
        }
        combo.updated_at = Utc::now();
        let combo = combo.clone();
        Ok(tables.combo_details(&combo))
    }

    pub async fn delete_combo(&self, combo_id: u64, user_id: u64, is_admin: bool) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        tables.combo_for_edit(combo_id, user_id, is_admin)?;
        tables.combos.remove(&combo_id);
        Ok(())
    }

    pub async fn get_combo(&self, combo_id: u64) -> StoreResult<ComboDetails> {
        let tables = self.inner.read().await;
        let combo = tables.combos.get(&combo_id).ok_or(StoreError::NotFound("Combo"))?;
        Ok(tables.combo_details(combo))
    }

    /// All combos, newest first.
    pub async fn list_combos(&self) -> Vec<ComboDetails> {
        let tables = self.inner.read().await;
        tables.combos.values().rev().map(|c| tables.combo_details(c)).collect()
    }

    /// Combos that show the given book.
    pub async fn combos_for_book(&self, book_id: u64) -> StoreResult<Vec<BookComboSummary>> {
        let tables = self.inner.read().await;
        if tables.live_book(book_id).is_none() {
            return Err(StoreError::NotFound("Book"));
        }
        Ok(tables
            .combos
            .values()
            .filter(|c| c.items.iter().any(|i| i.book_id == book_id && !i.is_hidden))
            .map(|c| BookComboSummary {
                combo_id: c.id,
                title: c.title.clone(),
                description: c.description.clone(),
                created_by: tables.username_of(c.created_by).unwrap_or_default(),
            })
            .collect())
    }
}
