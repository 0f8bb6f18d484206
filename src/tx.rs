//! Transaction wrapper for registry writes
//!
//! Every user write goes through `put_user`/`delete_user` so the anchor
//! index always mirrors the rights stored in the user records. Entity writes
//! keep the child index in step with `parent_id` the same way.

use heed::RwTxn;

use crate::db::{dbs, encode, env, get_json, index_members, list_json, Dbs};
use crate::error::{err, Result};
use crate::keys::{anchor_key, anchor_prefix, child_key, child_prefix};
use crate::model::{Entity, User};

/// Transaction wrapper for batched writes
pub struct Tx {
    txn: RwTxn<'static>,
    dbs: &'static Dbs,
}

impl Tx {
    #[inline]
    pub(crate) fn new() -> Result<Self> {
        Ok(Tx {
            txn: env()?.write_txn().map_err(err)?,
            dbs: dbs()?,
        })
    }

    #[inline]
    pub(crate) fn tx(&mut self) -> &mut RwTxn<'static> {
        &mut self.txn
    }

    #[inline]
    pub(crate) fn dbs(&self) -> &'static Dbs {
        self.dbs
    }

    #[inline]
    pub(crate) fn commit(self) -> Result<()> {
        self.txn.commit().map_err(err)
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub fn get_user(&mut self, name: &str) -> Result<Option<User>> {
        let d = self.dbs;
        get_json(&d.users, self.tx(), name)
    }

    pub fn user_exists(&mut self, name: &str) -> Result<bool> {
        let d = self.dbs;
        Ok(d.users.get(self.tx(), name).map_err(err)?.is_some())
    }

    pub fn list_users(&mut self) -> Result<Vec<User>> {
        let d = self.dbs;
        list_json(&d.users, self.tx())
    }

    /// Store a user record and re-index its anchors
    pub fn put_user(&mut self, user: &User) -> Result<()> {
        let d = self.dbs;
        if let Some(old) = self.get_user(&user.name)? {
            self.unindex(&old)?;
        }
        d.users.put(self.tx(), &user.name, &encode(user)?).map_err(err)?;
        for anchor in user.anchor_ids() {
            d.anchors.put(self.tx(), &anchor_key(anchor, &user.name), &()).map_err(err)?;
        }
        Ok(())
    }

    /// Remove a user record and its index entries; returns the removed record
    pub fn delete_user(&mut self, name: &str) -> Result<Option<User>> {
        let d = self.dbs;
        let Some(old) = self.get_user(name)? else { return Ok(None) };
        self.unindex(&old)?;
        d.users.delete(self.tx(), name).map_err(err)?;
        Ok(Some(old))
    }

    fn unindex(&mut self, user: &User) -> Result<()> {
        let d = self.dbs;
        for anchor in user.anchor_ids() {
            d.anchors.delete(self.tx(), &anchor_key(anchor, &user.name)).map_err(err)?;
        }
        Ok(())
    }

    /// Names of users holding any right keyed by `anchor_id`
    pub fn users_with_anchor(&mut self, anchor_id: &str) -> Result<Vec<String>> {
        let d = self.dbs;
        index_members(&d.anchors, self.tx(), &anchor_prefix(anchor_id))
    }

    /// Strip every right keyed by `anchor_id` from every user; roles left empty
    /// are detached. Returns the names of the users that changed.
    pub fn purge_anchor(&mut self, anchor_id: &str) -> Result<Vec<String>> {
        let mut changed = Vec::new();
        for name in self.users_with_anchor(anchor_id)? {
            let Some(mut user) = self.get_user(&name)? else { continue };
            if user.purge_anchor(anchor_id) {
                self.put_user(&user)?;
                changed.push(name);
            }
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    pub fn get_entity(&mut self, id: &str) -> Result<Option<Entity>> {
        let d = self.dbs;
        get_json(&d.entities, self.tx(), id)
    }

    /// Store an entity record and index it under its parent
    pub fn put_entity(&mut self, entity: &Entity) -> Result<()> {
        let d = self.dbs;
        if let Some(old) = self.get_entity(&entity.id)? {
            self.unlink(&old)?;
        }
        d.entities.put(self.tx(), &entity.id, &encode(entity)?).map_err(err)?;
        if let Some(parent) = entity.parent_id.as_deref().filter(|p| !p.is_empty()) {
            d.children.put(self.tx(), &child_key(parent, &entity.id), &()).map_err(err)?;
        }
        Ok(())
    }

    /// Remove an entity record and its child index entry; returns the removed record.
    /// Children of `id` are left in place.
    pub fn delete_entity(&mut self, id: &str) -> Result<Option<Entity>> {
        let d = self.dbs;
        let Some(old) = self.get_entity(id)? else { return Ok(None) };
        self.unlink(&old)?;
        d.entities.delete(self.tx(), id).map_err(err)?;
        Ok(Some(old))
    }

    fn unlink(&mut self, entity: &Entity) -> Result<()> {
        let d = self.dbs;
        if let Some(parent) = entity.parent_id.as_deref().filter(|p| !p.is_empty()) {
            d.children.delete(self.tx(), &child_key(parent, &entity.id)).map_err(err)?;
        }
        Ok(())
    }

    /// Ids of the direct children of `id`, in key order
    pub fn children_of(&mut self, id: &str) -> Result<Vec<String>> {
        let d = self.dbs;
        index_members(&d.children, self.tx(), &child_prefix(id))
    }
}

/// Run multiple operations in a single transaction
#[inline]
pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(f: F) -> Result<T> {
    let mut tx = Tx::new()?;
    let r = f(&mut tx)?;
    tx.commit()?;
    Ok(r)
}
