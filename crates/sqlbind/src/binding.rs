//! The binding protocol between generated code and the runtime.
//!
//! `#[derive(Crud)]` implements [`Bindable`], [`Enumerable`], [`Rebind`] and [`Table`].
//! Hand-written impls are fine as long as they follow the same contracts.

use crate::error::CrudResult;
use crate::value::{Assign, EpochTime, ToValue, Value};

/// Destination for one result column.
pub enum Slot<'a> {
    /// No target claimed the column yet.
    Unbound,
    /// The column is read and dropped.
    Discard,
    /// Decode into a field.
    Field(&'a mut dyn Assign),
    /// Decode integer epoch seconds into a time field.
    Epoch(&'a mut dyn EpochTime),
}

impl Slot<'_> {
    pub fn is_unbound(&self) -> bool {
        matches!(self, Slot::Unbound)
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Slot::Field(_) | Slot::Epoch(_))
    }
}

impl std::fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Slot::Unbound => "Unbound",
            Slot::Discard => "Discard",
            Slot::Field(_) => "Field",
            Slot::Epoch(_) => "Epoch",
        })
    }
}

/// One enumerated field value.
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    /// A field passed by address.
    Field(&'a dyn ToValue),
    /// An optional field; `None` binds NULL.
    Nullable(Option<&'a dyn ToValue>),
    /// A time field stored as Unix seconds.
    Epoch(&'a dyn EpochTime),
}

impl Arg<'_> {
    /// Resolve to the value bound as a statement parameter.
    pub fn to_value(&self) -> Value {
        match self {
            Arg::Field(v) => v.to_value(),
            Arg::Nullable(Some(v)) => v.to_value(),
            Arg::Nullable(None) => Value::Null,
            Arg::Epoch(t) => t.to_epoch(),
        }
    }
}

impl std::fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Arg").field(&self.to_value()).finish()
    }
}

/// Installs field destinations into value slots by column name.
pub trait Bindable {
    /// For every column equal to one of this type's columns, store that field's
    /// destination in the slot with the same index.
    ///
    /// `columns` are lowercased. Unmatched columns and slots already bound by an
    /// earlier target stay untouched; when a column name repeats, only its first
    /// occurrence is bound.
    fn bind_fields<'a>(&'a mut self, columns: &[String], slots: &mut [Slot<'a>]);

    /// Runs after every successful scan into this value.
    fn inflate(&mut self) -> CrudResult<()> {
        Ok(())
    }
}

/// Lists persisted column names with their current values.
pub trait Enumerable {
    /// Column names and values, pairwise, in column-name order.
    fn enumerate_fields(&self) -> (Vec<&'static str>, Vec<Arg<'_>>);

    /// Runs before every insert or update of this value.
    fn deflate(&mut self) -> CrudResult<()> {
        Ok(())
    }
}

/// User-supplied transformations around persistence.
///
/// Enable with `#[crud(hooks)]`; the generated [`Bindable::inflate`] and
/// [`Enumerable::deflate`] then delegate here.
pub trait Hooks {
    /// Convert in-memory state to its stored form.
    fn deflate(&mut self) -> CrudResult<()> {
        Ok(())
    }

    /// Convert stored state back to its in-memory form.
    fn inflate(&mut self) -> CrudResult<()> {
        Ok(())
    }
}

/// Table name and primary-key column of a bindable type.
pub trait Table {
    const NAME: &'static str;
    /// Empty when the type has no key.
    const KEY: &'static str;
}

/// Column-index to field-index mapping computed once per result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindPlan {
    fields: Vec<Option<usize>>,
}

impl BindPlan {
    /// Build a plan from lowercased column names; `lookup` maps a column to its
    /// field index. Later duplicates of a column are left unbound.
    pub fn new<F>(columns: &[String], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<usize>,
    {
        let mut taken = Vec::new();
        let fields = columns
            .iter()
            .map(|column| {
                let index = lookup(column.as_str())?;
                if taken.contains(&index) {
                    return None;
                }
                taken.push(index);
                Some(index)
            })
            .collect();
        Self { fields }
    }

    /// Field index for each column, in column order.
    pub fn fields(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.fields.iter().copied()
    }

    /// Number of columns the plan was built for.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of columns that map to a field.
    pub fn bound(&self) -> usize {
        self.fields.iter().filter(|f| f.is_some()).count()
    }
}

/// Reuse path: bind by precomputed field index instead of by name.
///
/// Combined with `Clone`, a prototype value can be copied for each row. Owned members
/// are deep-copied by `Clone`; scanned members are overwritten.
pub trait Rebind: Bindable + Sized {
    fn plan(columns: &[String]) -> BindPlan;

    fn bind_planned<'a>(&'a mut self, plan: &BindPlan, slots: &mut [Slot<'a>]);
}
