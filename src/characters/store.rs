//! Authoritative character store
//!
//! Records live in memory behind one async mutex per character, with
//! optional write-through to SQLite. The id index is a short-lived
//! synchronous lock and is never held across an await.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::model::{Character, CharacterId, CharacterKind, LastRolls, Sheet, Vital};
use super::stats::Stats;
use super::update::{CharacterUpdate, NewCharacter};
use crate::dice::DieType;
use crate::error::{CoreError, CoreResult};

type Slot = Arc<Mutex<Character>>;

/// Keyed store of every player, enemy and NPC
pub struct CharacterStore {
    /// Slots by id. Ids grow monotonically, so map order is insertion order.
    index: RwLock<BTreeMap<CharacterId, Slot>>,
    /// Next id when running without a database
    next_id: AtomicI64,
    /// Database pool for persistence
    pool: Option<SqlitePool>,
}

impl CharacterStore {
    /// Create an empty store, persisting to `pool` when given
    pub fn new(pool: Option<SqlitePool>) -> Self {
        Self {
            index: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            pool,
        }
    }

    /// Create an empty store with no persistence
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Create a store backed by `pool`, loading every stored character
    pub async fn load(pool: SqlitePool) -> CoreResult<Self> {
        let rows: Vec<CharacterRow> = sqlx::query_as(
            r#"
            SELECT id, kind, name, current_hp, max_hp, current_stam, max_stam,
                   last_d5_roll, last_d10_roll, last_d20_roll, last_d100_roll, last_die,
                   stats, sheet
            FROM characters ORDER BY id
            "#,
        )
        .fetch_all(&pool)
        .await?;

        let store = Self::new(Some(pool));
        {
            let mut index = store.index.write();
            for row in rows {
                let character = row.into_character()?;
                index.insert(character.id, Arc::new(Mutex::new(character)));
            }
            info!("Loaded {} characters", index.len());
        }
        Ok(store)
    }

    /// Wrap in Arc for sharing
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn slot(&self, id: CharacterId) -> CoreResult<Slot> {
        self.index
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound(id))
    }

    /// A slot is live while the index still points at it
    fn is_live(&self, id: CharacterId, slot: &Slot) -> bool {
        self.index
            .read()
            .get(&id)
            .is_some_and(|s| Arc::ptr_eq(s, slot))
    }

    /// Check whether a character exists
    pub fn contains(&self, id: CharacterId) -> bool {
        self.index.read().contains_key(&id)
    }

    /// Number of stored characters
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Get a consistent copy of a character
    pub async fn get(&self, id: CharacterId) -> CoreResult<Character> {
        let slot = self.slot(id)?;
        let character = slot.lock().await.clone();
        Ok(character)
    }

    /// Get a character, requiring it to be of `kind`
    pub async fn get_kind(&self, id: CharacterId, kind: CharacterKind) -> CoreResult<Character> {
        let character = self.get(id).await?;
        if character.kind() != kind {
            return Err(CoreError::NotFound(id));
        }
        Ok(character)
    }

    /// All characters of one kind, in creation order
    pub async fn list_by_kind(&self, kind: CharacterKind) -> Vec<Character> {
        let slots: Vec<Slot> = self.index.read().values().cloned().collect();

        let mut out = Vec::new();
        for slot in slots {
            let character = slot.lock().await;
            if character.kind() == kind {
                out.push(character.clone());
            }
        }
        out
    }

    /// Validate and insert a new character
    pub async fn create(&self, kind: CharacterKind, request: NewCharacter) -> CoreResult<Character> {
        let draft = request.into_draft(kind)?;

        let id = match &self.pool {
            Some(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO characters (kind, name, current_hp, max_hp, current_stam, max_stam, stats, sheet)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(kind.as_str())
                .bind(&draft.name)
                .bind(draft.hp.current())
                .bind(draft.hp.max())
                .bind(draft.stamina.current())
                .bind(draft.stamina.max())
                .bind(encode_stats(&draft.stats))
                .bind(encode_sheet(&draft.sheet))
                .execute(pool)
                .await?;
                CharacterId(result.last_insert_rowid())
            }
            None => CharacterId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        };

        let character = Character::from_draft(id, draft);
        self.index
            .write()
            .insert(id, Arc::new(Mutex::new(character.clone())));

        info!("Created {} {} ({})", kind, character.name, id);
        Ok(character)
    }

    /// Run `f` against a working copy inside the character's critical section.
    ///
    /// The copy is persisted and committed only if `f` succeeds, so readers
    /// see either the old record or the whole new one.
    pub async fn modify<T, F>(&self, id: CharacterId, f: F) -> CoreResult<(Character, T)>
    where
        F: FnOnce(&mut Character) -> CoreResult<T>,
    {
        self.modify_then(id, f, |_, _| {}).await
    }

    /// Like [`modify`](Self::modify), then run `on_commit` on the committed
    /// record before the lock is released. Commits of one character reach
    /// `on_commit` in commit order, so it must not block.
    pub async fn modify_then<T, F, C>(
        &self,
        id: CharacterId,
        f: F,
        on_commit: C,
    ) -> CoreResult<(Character, T)>
    where
        F: FnOnce(&mut Character) -> CoreResult<T>,
        C: FnOnce(&Character, &T),
    {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        if !self.is_live(id, &slot) {
            return Err(CoreError::NotFound(id));
        }

        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next.clone();
        on_commit(&next, &out);

        Ok((next, out))
    }

    /// Apply a partial update
    pub async fn apply_update(
        &self,
        id: CharacterId,
        update: &CharacterUpdate,
    ) -> CoreResult<Character> {
        self.apply_update_then(id, update, |_| {}).await
    }

    /// Apply a partial update, running `on_commit` inside the critical section
    pub async fn apply_update_then<C>(
        &self,
        id: CharacterId,
        update: &CharacterUpdate,
        on_commit: C,
    ) -> CoreResult<Character>
    where
        C: FnOnce(&Character),
    {
        let (character, ()) = self
            .modify_then(
                id,
                |c| update.apply_to(c).map_err(CoreError::from),
                |c, _| on_commit(c),
            )
            .await?;
        debug!(
            "Updated {} ({}): {:?}",
            character.name,
            id,
            update.fields().map(|f| f.key()).collect::<Vec<_>>()
        );
        Ok(character)
    }

    /// Administrative removal. Pending updates on the removed record fail
    /// with `NotFound`.
    pub async fn remove(&self, id: CharacterId) -> CoreResult<Character> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        if !self.is_live(id, &slot) {
            return Err(CoreError::NotFound(id));
        }

        if let Some(pool) = &self.pool {
            sqlx::query("DELETE FROM characters WHERE id = ?")
                .bind(id.0)
                .execute(pool)
                .await?;
        }
        self.index.write().remove(&id);

        info!("Removed {} {} ({})", guard.kind(), guard.name, id);
        Ok(guard.clone())
    }

    async fn persist(&self, c: &Character) -> CoreResult<()> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        sqlx::query(
            r#"
            UPDATE characters
            SET name = ?, current_hp = ?, max_hp = ?, current_stam = ?, max_stam = ?,
                last_d5_roll = ?, last_d10_roll = ?, last_d20_roll = ?, last_d100_roll = ?,
                last_die = ?, stats = ?, sheet = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&c.name)
        .bind(c.hp.current())
        .bind(c.hp.max())
        .bind(c.stamina.current())
        .bind(c.stamina.max())
        .bind(c.rolls.get(DieType::D5).map(i64::from))
        .bind(c.rolls.get(DieType::D10).map(i64::from))
        .bind(c.rolls.get(DieType::D20).map(i64::from))
        .bind(c.rolls.get(DieType::D100).map(i64::from))
        .bind(c.rolls.last_die().map(DieType::key))
        .bind(encode_stats(&c.stats))
        .bind(encode_sheet(&c.sheet))
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(c.id.0)
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn encode_stats(stats: &Stats) -> String {
    serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string())
}

fn encode_sheet(sheet: &Sheet) -> String {
    sheet.to_json().unwrap_or_else(|_| "{}".to_string())
}

#[derive(sqlx::FromRow)]
struct CharacterRow {
    id: i64,
    kind: String,
    name: String,
    current_hp: f64,
    max_hp: f64,
    current_stam: f64,
    max_stam: f64,
    last_d5_roll: Option<i64>,
    last_d10_roll: Option<i64>,
    last_d20_roll: Option<i64>,
    last_d100_roll: Option<i64>,
    last_die: Option<String>,
    stats: String,
    sheet: String,
}

impl CharacterRow {
    fn into_character(self) -> CoreResult<Character> {
        let id = CharacterId(self.id);
        let corrupt = |source| CoreError::Corrupt { id, source };

        let kind = CharacterKind::parse(&self.kind).ok_or_else(|| {
            corrupt(serde::de::Error::custom(format!(
                "unknown kind {}",
                self.kind
            )))
        })?;
        let sheet = Sheet::from_json(kind, &self.sheet).map_err(corrupt)?;
        let stats: Stats = serde_json::from_str(&self.stats).map_err(corrupt)?;
        let roll = |v: Option<i64>| v.and_then(|r| u32::try_from(r).ok());

        Ok(Character {
            id,
            name: self.name,
            hp: Vital::new(self.current_hp, self.max_hp),
            stamina: Vital::new(self.current_stam, self.max_stam),
            rolls: LastRolls::from_parts(
                roll(self.last_d5_roll),
                roll(self.last_d10_roll),
                roll(self.last_d20_roll),
                roll(self.last_d100_roll),
                self.last_die.and_then(|d| d.parse().ok()),
            ),
            stats,
            sheet,
        })
    }
}
