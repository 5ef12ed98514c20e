//! The public shape of encodable types.
//!
//! Rust has no runtime reflection, so every encodable type states its shape
//! up front through [`FieldType::shape`]. Object types additionally list
//! their fields through [`Schema::describe`]; `#[derive(Describe)]` writes
//! both for structs with named fields.
//!
//! A [`Descriptor`] is inert data: a list of named fields, each with a
//! [`Shape`] and a pair of type-erased accessors. The
//! [compiler](crate::compiler) turns it into a [`CompiledPlan`] once per
//! type.
//!
//! [`CompiledPlan`]: crate::compiler::CompiledPlan

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Decoder, Encoder, Malformed, Result, decode::malformed,
    primitive::Primitive,
};

/// Reads a field out of its owning object.
pub type Getter = fn(&dyn Any) -> &dyn Any;

/// Borrows a field of its owning object for assignment.
pub type Setter = fn(&mut dyn Any) -> &mut dyn Any;

/// A type that may appear as a field, an array element, or a root value.
pub trait FieldType: Any + Send + Sync + Sized {
    /// Returns how values of this type are laid out on the wire.
    fn shape() -> Shape;

    /// Returns the value assigned when a field of this type is absent.
    fn default_value() -> Self;
}

/// An object type: a named collection of fields.
///
/// Decoding starts from [`Default::default`] and assigns every described
/// field in turn, so fields left out of the descriptor keep their default.
pub trait Schema: FieldType + Default {
    /// Lists the fields that make up the wire layout of this type.
    fn describe() -> Descriptor;
}

/// A fieldless enum encoded as its integer discriminant.
pub trait WireEnum: Copy + Send + Sync + 'static {
    /// The integer kind the discriminant is written as.
    const REPR: Primitive;

    /// Returns the discriminant of `self`.
    fn to_discriminant(self) -> i128;

    /// Returns the variant with the given discriminant, if any.
    fn from_discriminant(discriminant: i128) -> Option<Self>;
}

/// How a type is laid out on the wire.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A fixed-width scalar.
    Primitive(Primitive),

    /// A length-prefixed UTF-8 string.
    String,

    /// A UTC instant.
    DateTime,

    /// A UUID.
    Guid,

    /// A fieldless enum.
    Enum(EnumShape),

    /// A counted sequence of elements.
    Array(ArrayShape),

    /// An optional value; `None` is written as an absent field.
    Nullable(NullableShape),

    /// A nested object.
    Object(ObjectShape),

    /// A type the wire format has no encoding for.
    Unsupported {
        /// The offending type.
        type_name: &'static str,

        /// Why it cannot be encoded.
        reason: &'static str,
    },
}

/// The erased codec of a [`WireEnum`].
#[derive(Debug, Clone, Copy)]
pub struct EnumShape {
    /// The enum type.
    pub type_name: &'static str,

    /// The integer kind of the discriminant.
    pub repr: Primitive,

    /// Writes the discriminant of an enum value.
    pub encode: fn(&dyn Any, &mut dyn Encoder) -> Result<()>,

    /// Reads a discriminant into an enum slot.
    pub decode: fn(&mut dyn Any, &mut dyn Decoder) -> Result<()>,
}

impl EnumShape {
    /// Builds the shape of `E`.
    #[must_use]
    pub fn of<E: WireEnum>() -> Self {
        fn encode<E: WireEnum>(
            value: &dyn Any,
            encoder: &mut dyn Encoder,
        ) -> Result<()> {
            let discriminant = downcast_ref::<E>(value).to_discriminant();
            E::REPR.emit_discriminant(discriminant, encoder)
        }

        fn decode<E: WireEnum>(
            slot: &mut dyn Any,
            decoder: &mut dyn Decoder,
        ) -> Result<()> {
            let offset = decoder.read_position();
            let value = E::REPR.read_discriminant(decoder)?;
            let variant = E::from_discriminant(value).ok_or_else(|| {
                malformed(offset, Malformed::InvalidDiscriminant {
                    type_name: std::any::type_name::<E>(),
                    value,
                })
            })?;

            *downcast_mut::<E>(slot) = variant;
            Ok(())
        }

        Self {
            type_name: std::any::type_name::<E>(),
            repr: E::REPR,
            encode: encode::<E>,
            decode: decode::<E>,
        }
    }
}

/// Visits each element of an erased sequence in order.
pub type Visit =
    fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> Result<()>) -> Result<()>;

/// Replaces an erased sequence with `count` freshly decoded elements.
pub type Fill = fn(
    &mut dyn Any,
    usize,
    &mut dyn FnMut(&mut dyn Any) -> Result<()>,
) -> Result<()>;

/// Upper bound, in bytes, on the capacity reserved before the elements of a
/// decoded array are read. Larger arrays grow as their elements arrive.
const MAX_PREALLOCATION: usize = 1024 * 1024;

/// The erased view of a `Vec<T>`.
#[derive(Debug, Clone)]
pub struct ArrayShape {
    /// The sequence type.
    pub type_name: &'static str,

    /// The shape of every element.
    pub element: Box<Shape>,

    /// Returns the number of elements.
    pub len: fn(&dyn Any) -> usize,

    /// Visits each element.
    pub visit: Visit,

    /// Rebuilds the sequence from decoded elements.
    pub fill: Fill,
}

impl ArrayShape {
    /// Builds the shape of `Vec<T>`.
    #[must_use]
    pub fn of<T: FieldType>() -> Self {
        fn len<T: FieldType>(value: &dyn Any) -> usize {
            downcast_ref::<Vec<T>>(value).len()
        }

        fn visit<T: FieldType>(
            value: &dyn Any,
            each: &mut dyn FnMut(&dyn Any) -> Result<()>,
        ) -> Result<()> {
            downcast_ref::<Vec<T>>(value).iter().try_for_each(|e| each(e))
        }

        fn fill<T: FieldType>(
            slot: &mut dyn Any,
            count: usize,
            each: &mut dyn FnMut(&mut dyn Any) -> Result<()>,
        ) -> Result<()> {
            let elements = downcast_mut::<Vec<T>>(slot);
            elements.clear();
            elements.reserve(count.min(
                MAX_PREALLOCATION / std::mem::size_of::<T>().max(1),
            ));

            for _ in 0..count {
                let mut element = T::default_value();
                each(&mut element)?;
                elements.push(element);
            }

            Ok(())
        }

        Self {
            type_name: std::any::type_name::<Vec<T>>(),
            element: Box::new(T::shape()),
            len: len::<T>,
            visit: visit::<T>,
            fill: fill::<T>,
        }
    }
}

/// The erased view of an `Option<T>`.
#[derive(Debug, Clone)]
pub struct NullableShape {
    /// The optional type.
    pub type_name: &'static str,

    /// The shape of the wrapped value.
    pub inner: Box<Shape>,

    /// Returns the wrapped value, if any.
    pub get: fn(&dyn Any) -> Option<&dyn Any>,

    /// Makes the slot `Some` and returns the wrapped value.
    pub fill: fn(&mut dyn Any) -> &mut dyn Any,

    /// Makes the slot `None`.
    pub clear: fn(&mut dyn Any),
}

impl NullableShape {
    /// Builds the shape of `Option<T>`.
    #[must_use]
    pub fn of<T: FieldType>() -> Self {
        fn get<T: FieldType>(value: &dyn Any) -> Option<&dyn Any> {
            downcast_ref::<Option<T>>(value).as_ref().map(|v| v as &dyn Any)
        }

        fn fill<T: FieldType>(slot: &mut dyn Any) -> &mut dyn Any {
            downcast_mut::<Option<T>>(slot).get_or_insert_with(T::default_value)
        }

        fn clear<T: FieldType>(slot: &mut dyn Any) {
            *downcast_mut::<Option<T>>(slot) = None;
        }

        Self {
            type_name: std::any::type_name::<Option<T>>(),
            inner: Box::new(T::shape()),
            get: get::<T>,
            fill: fill::<T>,
            clear: clear::<T>,
        }
    }
}

/// The erased view of a nested object, held either inline or boxed.
#[derive(Debug, Clone, Copy)]
pub struct ObjectShape {
    /// The object type (never the box around it).
    pub type_id: TypeId,

    /// The object type's name.
    pub type_name: &'static str,

    /// Produces the object's descriptor.
    pub describe: fn() -> Descriptor,

    /// Borrows the object out of its slot.
    pub deref: fn(&dyn Any) -> &dyn Any,

    /// Mutably borrows the object out of its slot.
    pub deref_mut: fn(&mut dyn Any) -> &mut dyn Any,
}

impl ObjectShape {
    /// Builds the shape of an object stored inline.
    #[must_use]
    pub fn of<O: Schema>() -> Self {
        Self {
            type_id: TypeId::of::<O>(),
            type_name: std::any::type_name::<O>(),
            describe: O::describe,
            deref: |value| value,
            deref_mut: |slot| slot,
        }
    }

    /// Builds the shape of an object stored as `Box<O>`.
    #[must_use]
    pub fn boxed<O: Schema>() -> Self {
        fn deref<O: Schema>(value: &dyn Any) -> &dyn Any {
            &**downcast_ref::<Box<O>>(value)
        }

        fn deref_mut<O: Schema>(slot: &mut dyn Any) -> &mut dyn Any {
            &mut **downcast_mut::<Box<O>>(slot)
        }

        Self { deref: deref::<O>, deref_mut: deref_mut::<O>, ..Self::of::<O>() }
    }
}

/// One field of an object.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    shape: Shape,
    reset: fn(&mut dyn Any),
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl FieldDescriptor {
    /// Creates a field of type `F` with no accessors.
    #[must_use]
    pub fn new<F: FieldType>(name: &'static str) -> Self {
        fn reset<F: FieldType>(slot: &mut dyn Any) {
            *downcast_mut::<F>(slot) = F::default_value();
        }

        Self {
            name,
            shape: F::shape(),
            reset: reset::<F>,
            getter: None,
            setter: None,
        }
    }

    /// Sets the accessor used to read the field when encoding.
    #[must_use]
    pub fn getter(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Sets the accessor used to assign the field when decoding.
    #[must_use]
    pub fn setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// Returns the field's wire shape.
    #[must_use]
    pub const fn shape(&self) -> &Shape { &self.shape }

    /// Returns the function that assigns the field's default to a slot.
    #[must_use]
    pub const fn reset(&self) -> fn(&mut dyn Any) { self.reset }

    /// Returns the read accessor, if any.
    #[must_use]
    pub const fn get(&self) -> Option<Getter> { self.getter }

    /// Returns the write accessor, if any.
    #[must_use]
    pub const fn set(&self) -> Option<Setter> { self.setter }
}

/// The public shape of an object type.
#[derive(Debug, Clone)]
pub struct Descriptor {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl Descriptor {
    /// Starts an empty descriptor of `O`.
    #[must_use]
    pub fn new<O: Any>() -> Self {
        Self {
            type_id: TypeId::of::<O>(),
            type_name: std::any::type_name::<O>(),
            fields: Vec::new(),
        }
    }

    /// Appends a field. Declaration order does not affect the wire layout.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the described type's id.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// Returns the described type's name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }

    pub(crate) fn into_fields(self) -> Vec<FieldDescriptor> { self.fields }
}

/// Downcasts a value a compiled plan was applied to.
///
/// # Panics
///
/// Panics if `value` is not a `T`, which means a plan was run against a
/// value of another type.
#[track_caller]
#[must_use]
pub fn downcast_ref<T: Any>(value: &dyn Any) -> &T {
    value.downcast_ref::<T>().expect("value type mismatch")
}

/// Mutable counterpart of [`downcast_ref`].
///
/// # Panics
///
/// Panics if `slot` is not a `T`.
#[track_caller]
pub fn downcast_mut<T: Any>(slot: &mut dyn Any) -> &mut T {
    slot.downcast_mut::<T>().expect("value type mismatch")
}

// =============================================================================
// FieldType implementations
// =============================================================================

macro_rules! impl_primitive_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn shape() -> Shape { Shape::Primitive(Primitive::$kind) }

                fn default_value() -> Self { Self::default() }
            }
        )*
    };
}

impl_primitive_field! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
}

impl FieldType for String {
    fn shape() -> Shape { Shape::String }

    fn default_value() -> Self { Self::new() }
}

impl FieldType for DateTime<Utc> {
    fn shape() -> Shape { Shape::DateTime }

    fn default_value() -> Self { Self::UNIX_EPOCH }
}

impl FieldType for Uuid {
    fn shape() -> Shape { Shape::Guid }

    fn default_value() -> Self { Self::nil() }
}

impl<T: FieldType> FieldType for Option<T> {
    fn shape() -> Shape { Shape::Nullable(NullableShape::of::<T>()) }

    fn default_value() -> Self { None }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn shape() -> Shape { Shape::Array(ArrayShape::of::<T>()) }

    fn default_value() -> Self { Self::new() }
}

impl<O: Schema> FieldType for Box<O> {
    fn shape() -> Shape { Shape::Object(ObjectShape::boxed::<O>()) }

    fn default_value() -> Self { Box::new(O::default_value()) }
}

// Types that may be declared as fields but have no wire encoding. Using one
// fails when the owning type's plan is compiled, not when it is declared.

impl<K, V, S> FieldType for HashMap<K, V, S>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: Default + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Unsupported {
            type_name: std::any::type_name::<Self>(),
            reason: "maps have no wire encoding",
        }
    }

    fn default_value() -> Self { Self::default() }
}

impl<K, V> FieldType for BTreeMap<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Unsupported {
            type_name: std::any::type_name::<Self>(),
            reason: "maps have no wire encoding",
        }
    }

    fn default_value() -> Self { Self::new() }
}

impl<T, S> FieldType for HashSet<T, S>
where
    T: Send + Sync + 'static,
    S: Default + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Unsupported {
            type_name: std::any::type_name::<Self>(),
            reason: "sets have no wire encoding",
        }
    }

    fn default_value() -> Self { Self::default() }
}

impl FieldType for Arc<dyn Any + Send + Sync> {
    fn shape() -> Shape {
        Shape::Unsupported {
            type_name: "Arc<dyn Any + Send + Sync>",
            reason: "the concrete type of a dynamic value is not known",
        }
    }

    fn default_value() -> Self { Arc::new(()) }
}
