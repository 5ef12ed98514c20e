//! The process-wide cache of compiled plans.

use std::{
    any::TypeId,
    sync::{Arc, LazyLock},
};

use dashmap::DashMap;
use fxhash::FxBuildHasher;

use crate::{
    Result,
    compiler::{self, CompiledPlan, ValueCodec},
    descriptor::{FieldType, ObjectShape, Schema},
};

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Compiled plans keyed by the type they encode.
///
/// Plans are compiled on first use and never evicted. Several threads may
/// compile the same type at once; the first plan inserted is kept and handed
/// to every caller, the others are dropped. Failed compilations leave no
/// entry behind, so they are retried (and fail again) on the next use.
///
/// Codecs of root values that are not objects themselves (a root `Vec<T>`)
/// are cached the same way, keyed by the root type.
#[derive(Debug, Default)]
pub struct Registry {
    plans: DashMap<TypeId, Arc<CompiledPlan>, FxBuildHasher>,
    values: DashMap<TypeId, Arc<ValueCodec>, FxBuildHasher>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the registry shared by every [`Codec`](crate::Codec).
    #[must_use]
    pub fn global() -> &'static Self { &GLOBAL }

    /// Returns the plan of `T`, compiling it first if needed.
    pub fn plan<T: Schema>(&'static self) -> Result<Arc<CompiledPlan>> {
        self.plan_for(&ObjectShape::of::<T>())
    }

    /// Returns `true` if the plan of `T` has been compiled.
    #[must_use]
    pub fn contains<T: Schema>(&self) -> bool {
        self.plans.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of compiled plans.
    #[must_use]
    pub fn len(&self) -> usize { self.plans.len() }

    /// Returns `true` if nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.plans.is_empty() }

    pub(crate) fn plan_for(
        &'static self,
        shape: &ObjectShape,
    ) -> Result<Arc<CompiledPlan>> {
        if let Some(plan) = self.get(shape.type_id) {
            return Ok(plan);
        }

        compiler::compile(shape, self)
    }

    /// Returns the codec of a root `T` that is not an object, compiling it
    /// first if needed.
    pub(crate) fn value_codec_for<T: FieldType>(
        &'static self,
    ) -> Result<Arc<ValueCodec>> {
        let type_id = TypeId::of::<T>();
        if let Some(codec) = self.values.get(&type_id) {
            return Ok(codec.value().clone());
        }

        let codec = compiler::compile_value(&T::shape(), self)?;

        Ok(self
            .values
            .entry(type_id)
            .or_insert_with(|| Arc::new(codec))
            .value()
            .clone())
    }

    pub(crate) fn get(&self, type_id: TypeId) -> Option<Arc<CompiledPlan>> {
        self.plans.get(&type_id).map(|entry| entry.value().clone())
    }

    /// Inserts `plan` unless a plan for its type is already present, and
    /// returns whichever plan ends up stored.
    pub(crate) fn insert(&self, plan: CompiledPlan) -> Arc<CompiledPlan> {
        self.plans
            .entry(plan.type_id())
            .or_insert_with(|| Arc::new(plan))
            .value()
            .clone()
    }
}
