//! Editable working copy of a form.
//!
//! A buffer owns an arena of names; operands inside the buffer refer to
//! arena ids, so a name keeps its identity however much the name list is
//! reordered. An edit transaction runs between [`start_edit`] and
//! [`end_edit`]:
//!
//! - every replaced slot is recorded against a snapshot of the original
//!   name list, and later expressions are rewritten to the replacements
//!   when the transaction ends
//! - names that became duplicates are removed, keeping the occurrence
//!   that was not a replacement (a removed parameter slot shrinks the arity)
//! - expressions that ended up among the parameters are moved after them,
//!   preserving relative order
//!
//! [`start_edit`]: LambdaFormBuffer::start_edit
//! [`end_edit`]: LambdaFormBuffer::end_edit

use std::collections::HashMap;
use std::sync::Arc;

use crate::form::{Arg, FormKind, LambdaForm, Name, NameIndex, NamedFunction};

/// Arena id of a name inside a buffer.
pub type NameId = NameIndex;

pub struct LambdaFormBuffer {
    arena: Vec<Name>,
    arity: usize,
    names: Vec<Option<NameId>>,
    original: Vec<Option<NameId>>,
    first_change: usize,
    result: Option<NameId>,
    dups: Vec<NameId>,
    in_trans: bool,
}

impl LambdaFormBuffer {
    /// Open a buffer over `form`. Arena ids of the existing names equal
    /// their positions, so the form's operands are valid as-is.
    pub fn new(form: &LambdaForm) -> Self {
        let arena = form.names().to_vec();
        let names = (0..arena.len()).map(|i| Some(i as NameId)).collect();
        let buf = Self {
            arena,
            arity: form.arity(),
            names,
            original: Vec::new(),
            first_change: 0,
            result: form.result().map(|r| r as NameId),
            dups: Vec::new(),
            in_trans: false,
        };
        buf.verify_arity();
        buf
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn result(&self) -> Option<NameId> {
        self.result
    }

    /// Id of the name currently at `pos`.
    pub fn id_at(&self, pos: usize) -> NameId {
        self.names[pos].unwrap_or_else(|| panic!("no name at {pos}"))
    }

    pub fn name(&self, id: NameId) -> &Name {
        &self.arena[id as usize]
    }

    /// The name currently at `pos`.
    pub fn name_at(&self, pos: usize) -> &Name {
        self.name(self.id_at(pos))
    }

    /// Operand referring to the name currently at `pos`.
    pub fn arg_at(&self, pos: usize) -> Arg {
        Arg::Name(self.id_at(pos))
    }

    /// Add a name to the arena without placing it. Its operands must be
    /// arena ids.
    pub fn alloc(&mut self, name: Name) -> NameId {
        debug_assert!(
            name.args()
                .iter()
                .filter_map(Arg::as_name)
                .all(|id| (id as usize) < self.arena.len()),
            "operand refers outside the arena"
        );
        self.arena.push(name);
        (self.arena.len() - 1) as NameId
    }

    pub fn last_index_of(&self, id: NameId) -> Option<usize> {
        self.names.iter().rposition(|n| *n == Some(id))
    }

    fn verify_arity(&self) {
        for (pos, slot) in self.names.iter().enumerate() {
            let Some(id) = slot else { continue };
            let is_param = self.name(*id).is_param();
            assert_eq!(
                is_param,
                pos < self.arity,
                "name {pos} is misplaced relative to arity {}",
                self.arity
            );
        }
    }

    pub fn start_edit(&mut self) {
        assert!(!self.in_trans, "edit already in progress");
        self.verify_arity();
        self.original = self.names.clone();
        self.first_change = self.names.len();
        self.in_trans = true;
    }

    /// Replace the name at `pos`. A position may change at most once per edit.
    fn change_name(&mut self, pos: usize, id: NameId) {
        assert!(self.in_trans, "no edit in progress");
        let old = self.names[pos];
        assert_eq!(old, self.original[pos], "name {pos} changed twice");
        self.names[pos] = Some(id);
        self.first_change = self.first_change.min(pos);
        if old.is_some() && self.result == old {
            self.result = Some(id);
        }
    }

    /// Point the form's result at `id` (or at nothing).
    pub fn set_result(&mut self, id: Option<NameId>) {
        if let Some(id) = id {
            assert!(self.last_index_of(id).is_some(), "result {id} is not placed");
        }
        self.result = id;
    }

    /// Swap the function of every expression calling `old[k]` with exactly
    /// `for_args` for `new[k]`.
    pub fn replace_functions(
        &mut self,
        old: &[NamedFunction],
        new: &[NamedFunction],
        for_args: &[Arg],
    ) {
        assert!(new.len() >= old.len());
        for pos in self.arity..self.names.len() {
            let Some(id) = self.names[pos] else { continue };
            let name = self.name(id);
            let Some(function) = name.function() else { continue };
            if name.args() != for_args {
                continue;
            }
            let Some(k) = old.iter().position(|f| f == function) else {
                continue;
            };
            let replaced = Name::expr(new[k].clone(), for_args.iter().cloned());
            let new_id = self.alloc(replaced);
            self.change_name(pos, new_id);
        }
    }

    fn replace_name(&mut self, pos: usize, binding: NameId) {
        assert!(pos < self.arity, "position {pos} is not a parameter");
        let old = self.name_at(pos);
        assert!(old.is_param());
        assert_eq!(old.ty(), self.name(binding).ty(), "retyping parameter {pos}");
        self.change_name(pos, binding);
    }

    /// Replace parameter `pos` with another, unplaced, parameter.
    pub fn rename_parameter(&mut self, pos: usize, param: NameId) {
        assert!(self.name(param).is_param());
        self.replace_name(pos, param);
    }

    /// Replace parameter `pos` with a new expression computing its value.
    pub fn replace_parameter_by_new_expression(&mut self, pos: usize, expr: NameId) {
        assert!(!self.name(expr).is_param());
        assert!(self.last_index_of(expr).is_none(), "expression already placed");
        self.replace_name(pos, expr);
    }

    /// Make parameter `pos` an alias of the name at `value_pos`.
    pub fn replace_parameter_by_copy(&mut self, pos: usize, value_pos: usize) {
        assert_ne!(pos, value_pos);
        let value = self.id_at(value_pos);
        self.replace_name(pos, value);
        self.dups.push(value);
    }

    fn insert_name(&mut self, pos: usize, id: NameId, is_param: bool) {
        assert!(self.in_trans, "no edit in progress");
        if is_param {
            assert!(pos <= self.arity, "parameter inserted at {pos} past arity");
        } else {
            assert!(pos >= self.arity, "expression inserted at {pos} among parameters");
        }
        self.names.insert(pos, None);
        self.original.insert(pos, None);
        if self.first_change >= pos {
            self.first_change += 1;
        }
        if is_param {
            self.arity += 1;
        }
        self.change_name(pos, id);
    }

    pub fn insert_parameter(&mut self, pos: usize, param: NameId) {
        assert!(self.name(param).is_param());
        self.insert_name(pos, param, true);
    }

    pub fn insert_expression(&mut self, pos: usize, expr: NameId) {
        assert!(!self.name(expr).is_param());
        self.insert_name(pos, expr, false);
    }

    /// Close the transaction and publish the edited form.
    pub fn end_edit(mut self) -> Arc<LambdaForm> {
        assert!(self.in_trans, "no edit in progress");
        self.repair_references();
        self.in_trans = false;
        self.clear_duplicates_and_nulls();
        self.partition_parameters();
        self.verify_arity();
        self.publish()
    }

    /// Rewrite operands that still name a replaced original to its replacement.
    fn repair_references(&mut self) {
        let mut remap: HashMap<NameId, NameId> = HashMap::new();
        for pos in self.first_change..self.names.len() {
            let Some(id) = self.names[pos] else { continue };
            let mut current = id;
            if pos >= self.arity && !remap.is_empty() {
                let rewritten = self.name(id).map_args(|a| resolve(&remap, a));
                if let Some(rewritten) = rewritten {
                    current = self.alloc(rewritten);
                    self.names[pos] = Some(current);
                    remap.insert(id, current);
                    if self.result == Some(id) {
                        self.result = Some(current);
                    }
                }
            }
            if let Some(orig) = self.original[pos]
                && orig != current
            {
                remap.insert(orig, current);
            }
        }
    }

    fn clear_duplicates_and_nulls(&mut self) {
        for dup in std::mem::take(&mut self.dups) {
            let killed = (self.first_change..self.names.len())
                .find(|&pos| self.names[pos] == Some(dup) && self.original[pos] != Some(dup));
            let pos = killed.unwrap_or_else(|| panic!("duplicate {dup} not found"));
            self.names[pos] = None;
            self.original[pos] = None;
            if pos < self.arity {
                self.arity -= 1;
            }
        }
        let original = std::mem::take(&mut self.original);
        let mut kept_original = Vec::with_capacity(original.len());
        let mut kept_names = Vec::with_capacity(self.names.len());
        for (name, orig) in self.names.drain(..).zip(original) {
            if name.is_some() {
                kept_names.push(name);
                kept_original.push(orig);
            }
        }
        self.names = kept_names;
        self.original = kept_original;
    }

    /// Stable partition of `[first_change, arity)`: parameters first.
    fn partition_parameters(&mut self) {
        if self.first_change >= self.arity {
            return;
        }
        let region = self.first_change..self.arity.min(self.names.len());
        let (params, exprs): (Vec<_>, Vec<_>) = self.names[region.clone()]
            .iter()
            .copied()
            .partition(|slot| slot.is_some_and(|id| self.name(id).is_param()));
        self.arity -= exprs.len();
        self.names.splice(region, params.into_iter().chain(exprs));
    }

    fn publish(self) -> Arc<LambdaForm> {
        let mut position: HashMap<NameId, NameIndex> = HashMap::with_capacity(self.names.len());
        let mut names = Vec::with_capacity(self.names.len());
        for (pos, slot) in self.names.iter().enumerate() {
            let id = slot.unwrap_or_else(|| panic!("hole at {pos}"));
            let name = self.name(id);
            let placed = name
                .map_args(|a| match position.get(&a) {
                    Some(&p) => p,
                    None => panic!("name {pos} refers to unplaced or later name {a}"),
                })
                .unwrap_or_else(|| name.clone());
            names.push(placed);
            position.insert(id, pos as NameIndex);
        }
        let result = self.result.map(|id| match position.get(&id) {
            Some(&p) => p as usize,
            None => panic!("result {id} is not placed"),
        });
        LambdaForm::new(self.arity, names, result, FormKind::Generic)
    }
}

/// Follow replacement chains to the newest name.
fn resolve(remap: &HashMap<NameId, NameId>, mut id: NameId) -> NameId {
    while let Some(&next) = remap.get(&id) {
        id = next;
    }
    id
}
