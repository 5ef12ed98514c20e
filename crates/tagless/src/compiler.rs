//! Turns descriptors into reusable encode/decode plans.
//!
//! Compilation happens once per object type. The compiler walks the type's
//! [`Descriptor`], sorts its fields, classifies each field's [`Shape`] and
//! emits a closure pair per field. The resulting [`CompiledPlan`] is stored
//! in the [`Registry`] and reused by every later call.
//!
//! # Field order
//!
//! Fields are written in ascending order of their upper-cased names; fields
//! whose names only differ in case are ordered by their exact names. The
//! order a type declares its fields in does not matter.
//!
//! # Recursive types
//!
//! A type that refers to itself (directly or through other types) would make
//! the compiler recurse forever. Every top-level compilation therefore keeps
//! a [`CompilingSet`]; a nested object whose type is still being compiled is
//! not inlined but dispatched through the registry when the plan runs.

use std::{
    any::{Any, TypeId},
    cmp::Ordering,
    fmt,
    sync::Arc,
};

use crate::{
    Decoder, Encoder, Error, Malformed, Result,
    decode::malformed,
    descriptor::{
        ArrayShape, Descriptor, FieldDescriptor, Getter, NullableShape,
        ObjectShape, Setter, Shape,
    },
    error::Accessor,
    guard::{CompilingSet, Depth},
    primitive::{
        self, DATE_TIME_WIDTH, GUID_WIDTH, LENGTH_PREFIX_WIDTH, Presence,
        Primitive,
    },
    registry::Registry,
};


type EncodeFn =
    Arc<dyn Fn(&dyn Any, &mut dyn Encoder, Depth) -> Result<()> + Send + Sync>;

type DecodeFn = Arc<
    dyn Fn(&mut dyn Any, &mut dyn Decoder, Depth) -> Result<()> + Send + Sync,
>;

fn encode_fn(
    f: impl Fn(&dyn Any, &mut dyn Encoder, Depth) -> Result<()>
    + Send
    + Sync
    + 'static,
) -> EncodeFn {
    Arc::new(f)
}

fn decode_fn(
    f: impl Fn(&mut dyn Any, &mut dyn Decoder, Depth) -> Result<()>
    + Send
    + Sync
    + 'static,
) -> DecodeFn {
    Arc::new(f)
}

/// How a field or value is encoded, as decided by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A fixed-width scalar.
    Primitive(Primitive),

    /// A length-prefixed string.
    String,

    /// A date/time.
    DateTime,

    /// A UUID.
    Guid,

    /// An enum written as an integer of the given kind.
    Enum(Primitive),

    /// A counted sequence of the given element kind.
    Array(Box<FieldKind>),

    /// A nested object of the named type.
    Object(&'static str),
}

/// The codec of a single value, without any presence flag.
#[derive(Clone)]
pub(crate) struct ValueCodec {
    kind: FieldKind,

    /// The fewest bytes any encoding of the value occupies.
    min_len: usize,

    encode: EncodeFn,
    decode: DecodeFn,
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec")
            .field("kind", &self.kind)
            .field("min_len", &self.min_len)
            .finish_non_exhaustive()
    }
}

impl ValueCodec {
    pub(crate) fn encode(
        &self,
        value: &dyn Any,
        encoder: &mut dyn Encoder,
        depth: Depth,
    ) -> Result<()> {
        (self.encode)(value, encoder, depth)
    }

    pub(crate) fn decode(
        &self,
        slot: &mut dyn Any,
        decoder: &mut dyn Decoder,
        depth: Depth,
    ) -> Result<()> {
        (self.decode)(slot, decoder, depth)
    }
}

/// The compiled encode/decode steps of one field.
pub struct FieldPlan {
    name: &'static str,
    kind: FieldKind,
    nullable: bool,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl FieldPlan {
    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// Returns how the field's payload is encoded.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind { &self.kind }

    /// Returns `true` if the field may be written as absent.
    #[must_use]
    pub const fn is_nullable(&self) -> bool { self.nullable }
}

impl fmt::Debug for FieldPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPlan")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// The cached encode/decode procedure of one object type.
#[derive(Debug)]
pub struct CompiledPlan {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldPlan>,
}

impl CompiledPlan {
    /// Returns the id of the type this plan encodes.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// Returns the name of the type this plan encodes.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// Returns the fields in wire order.
    #[must_use]
    pub fn fields(&self) -> &[FieldPlan] { &self.fields }

    /// Encodes an object one level below `depth`.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the type this plan was compiled for.
    pub fn encode(
        &self,
        value: &dyn Any,
        encoder: &mut dyn Encoder,
        depth: Depth,
    ) -> Result<()> {
        let depth = depth.enter(self.type_name)?;

        for field in &self.fields {
            (field.encode)(value, encoder, depth)
                .map_err(|err| err.in_field(self.type_name, field.name))?;
        }

        Ok(())
    }

    /// Decodes the fields of an object one level below `depth`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not of the type this plan was compiled for.
    pub fn decode(
        &self,
        slot: &mut dyn Any,
        decoder: &mut dyn Decoder,
        depth: Depth,
    ) -> Result<()> {
        let depth = depth.enter(self.type_name)?;

        for field in &self.fields {
            (field.decode)(slot, decoder, depth)
                .map_err(|err| err.in_field(self.type_name, field.name))?;
        }

        Ok(())
    }
}

/// Compiles the plan of an object type and every type it reaches that is
/// not compiled yet, caching all of them in `registry`.
///
/// Nothing is cached for a type whose compilation fails.
#[tracing::instrument(
    level = "debug",
    skip(shape, registry),
    fields(type_name = shape.type_name)
)]
pub fn compile(
    shape: &ObjectShape,
    registry: &'static Registry,
) -> Result<Arc<CompiledPlan>> {
    let mut compiling = CompilingSet::new();
    compile_object(shape, &mut compiling, registry)
}

/// Compiles the codec of a value that is not wrapped in an object field.
pub(crate) fn compile_value(
    shape: &Shape,
    registry: &'static Registry,
) -> Result<ValueCodec> {
    let mut compiling = CompilingSet::new();
    value_codec(shape, &mut compiling, registry)
}

fn compile_object(
    shape: &ObjectShape,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<Arc<CompiledPlan>> {
    compiling.insert(shape.type_id);
    let plan = build_plan((shape.describe)(), compiling, registry);
    compiling.remove(shape.type_id);

    let plan = registry.insert(plan?);

    tracing::debug!(
        type_name = plan.type_name,
        fields = plan.fields.len(),
        "compiled plan"
    );

    Ok(plan)
}

fn build_plan(
    descriptor: Descriptor,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<CompiledPlan> {
    let type_id = descriptor.type_id();
    let type_name = descriptor.type_name();

    let mut fields = descriptor.into_fields();
    fields.sort_by(|a, b| compare_names(a.name(), b.name()));

    let fields = fields
        .iter()
        .map(|field| field_plan(type_name, field, compiling, registry))
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledPlan { type_id, type_name, fields })
}

/// Orders names by their upper-cased characters, then by their exact
/// characters.
fn compare_names(a: &str, b: &str) -> Ordering {
    let upper_a = a.chars().map(fold_case);
    let upper_b = b.chars().map(fold_case);

    upper_a.cmp(upper_b).then_with(|| a.cmp(b))
}

/// Upper-cases one character. Characters whose upper case is more than one
/// character (`ß` is `SS`) are left as they are.
fn fold_case(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

fn field_plan(
    type_name: &'static str,
    field: &FieldDescriptor,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<FieldPlan> {
    let name = field.name();

    let get = field.get().ok_or(Error::MissingAccessor {
        type_name,
        field: name,
        accessor: Accessor::Getter,
    })?;
    let set = field.set().ok_or(Error::MissingAccessor {
        type_name,
        field: name,
        accessor: Accessor::Setter,
    })?;

    match field.shape() {
        Shape::Nullable(nullable) => {
            let value = nullable_codec(nullable, compiling, registry)
                .map_err(|err| err.in_field(type_name, name))?;
            Ok(nullable_field(name, get, set, nullable, value))
        }

        shape => {
            let value = value_codec(shape, compiling, registry)
                .map_err(|err| err.in_field(type_name, name))?;
            Ok(required_field(name, get, set, field.reset(), value))
        }
    }
}

fn nullable_codec(
    nullable: &NullableShape,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<ValueCodec> {
    if matches!(*nullable.inner, Shape::Nullable(_)) {
        return Err(Error::UnsupportedType {
            type_name: nullable.type_name,
            reason: "an option of an option cannot be told apart from none",
        });
    }

    value_codec(&nullable.inner, compiling, registry)
}

fn nullable_field(
    name: &'static str,
    get: Getter,
    set: Setter,
    nullable: &NullableShape,
    value: ValueCodec,
) -> FieldPlan {
    let (unwrap, fill, clear) = (nullable.get, nullable.fill, nullable.clear);
    let kind = value.kind.clone();
    let (encode_value, decode_value) = (value.encode, value.decode);

    FieldPlan {
        name,
        kind,
        nullable: true,
        encode: encode_fn(move |owner, encoder, depth| {
            match unwrap(get(owner)) {
                Some(inner) => {
                    encoder.emit_presence(Presence::Present)?;
                    encode_value(inner, encoder, depth)
                }
                None => encoder.emit_presence(Presence::Absent),
            }
        }),
        decode: decode_fn(move |owner, decoder, depth| {
            let slot = set(owner);
            match decoder.read_presence()? {
                Presence::Present => decode_value(fill(slot), decoder, depth),
                Presence::Absent => {
                    clear(slot);
                    Ok(())
                }
            }
        }),
    }
}

fn required_field(
    name: &'static str,
    get: Getter,
    set: Setter,
    reset: fn(&mut dyn Any),
    value: ValueCodec,
) -> FieldPlan {
    let kind = value.kind.clone();
    let (encode_value, decode_value) = (value.encode, value.decode);

    FieldPlan {
        name,
        kind,
        nullable: false,
        encode: encode_fn(move |owner, encoder, depth| {
            encoder.emit_presence(Presence::Present)?;
            encode_value(get(owner), encoder, depth)
        }),
        decode: decode_fn(move |owner, decoder, depth| {
            let slot = set(owner);
            match decoder.read_presence()? {
                Presence::Present => decode_value(slot, decoder, depth),
                Presence::Absent => {
                    reset(slot);
                    Ok(())
                }
            }
        }),
    }
}

fn value_codec(
    shape: &Shape,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<ValueCodec> {
    match shape {
        Shape::Primitive(kind) => {
            let kind = *kind;
            Ok(ValueCodec {
                kind: FieldKind::Primitive(kind),
                min_len: kind.width(),
                encode: encode_fn(move |value, encoder, _| {
                    kind.encode(value, encoder)
                }),
                decode: decode_fn(move |slot, decoder, _| {
                    kind.decode_into(slot, decoder)
                }),
            })
        }

        Shape::String => Ok(ValueCodec {
            kind: FieldKind::String,
            min_len: LENGTH_PREFIX_WIDTH,
            encode: encode_fn(|value, encoder, _| {
                primitive::encode_string(value, encoder)
            }),
            decode: decode_fn(|slot, decoder, _| {
                primitive::decode_string(slot, decoder)
            }),
        }),

        Shape::DateTime => Ok(ValueCodec {
            kind: FieldKind::DateTime,
            min_len: DATE_TIME_WIDTH,
            encode: encode_fn(|value, encoder, _| {
                primitive::encode_date_time(value, encoder)
            }),
            decode: decode_fn(|slot, decoder, _| {
                primitive::decode_date_time(slot, decoder)
            }),
        }),

        Shape::Guid => Ok(ValueCodec {
            kind: FieldKind::Guid,
            min_len: GUID_WIDTH,
            encode: encode_fn(|value, encoder, _| {
                primitive::encode_guid(value, encoder)
            }),
            decode: decode_fn(|slot, decoder, _| {
                primitive::decode_guid(slot, decoder)
            }),
        }),

        Shape::Enum(shape) => {
            let (encode, decode) = (shape.encode, shape.decode);
            Ok(ValueCodec {
                kind: FieldKind::Enum(shape.repr),
                min_len: shape.repr.width(),
                encode: encode_fn(move |value, encoder, _| {
                    encode(value, encoder)
                }),
                decode: decode_fn(move |slot, decoder, _| {
                    decode(slot, decoder)
                }),
            })
        }

        Shape::Array(array) => array_codec(array, compiling, registry),

        Shape::Object(object) => object_codec(object, compiling, registry),

        Shape::Nullable(nullable) => Err(Error::UnsupportedType {
            type_name: nullable.type_name,
            reason: "optional values are only supported as object fields",
        }),

        &Shape::Unsupported { type_name, reason } => {
            Err(Error::UnsupportedType { type_name, reason })
        }
    }
}

fn array_codec(
    array: &ArrayShape,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<ValueCodec> {
    match &*array.element {
        Shape::Nullable(_) => {
            return Err(Error::UnsupportedType {
                type_name: array.type_name,
                reason: "array elements cannot be optional",
            });
        }
        Shape::Array(_) => {
            return Err(Error::UnsupportedType {
                type_name: array.type_name,
                reason: "arrays of arrays are not supported",
            });
        }
        _ => {}
    }

    let ValueCodec {
        kind,
        min_len: min_element_len,
        encode: encode_element,
        decode: decode_element,
    } = value_codec(&array.element, compiling, registry)?;
    let (len, visit, fill) = (array.len, array.visit, array.fill);

    Ok(ValueCodec {
        kind: FieldKind::Array(Box::new(kind)),
        min_len: LENGTH_PREFIX_WIDTH,
        encode: encode_fn(move |value, encoder, depth| {
            encoder.emit_length(len(value))?;
            visit(value, &mut |item: &dyn Any| {
                encode_element(item, encoder, depth)
            })
        }),
        decode: decode_fn(move |slot, decoder, depth| {
            let offset = decoder.read_position();
            let count = decoder.read_length()?;

            // Elements of an object type with no described fields occupy
            // no bytes, so their count is bounded only by `i32::MAX`.
            let available = decoder.remaining();
            let fits = count
                .checked_mul(min_element_len)
                .is_some_and(|needed| needed <= available);
            if !fits {
                return Err(malformed(offset, Malformed::UnexpectedEnd {
                    requested: count.saturating_mul(min_element_len),
                    available,
                }));
            }

            fill(slot, count, &mut |item: &mut dyn Any| {
                decode_element(item, decoder, depth)
            })
        }),
    })
}

fn object_codec(
    object: &ObjectShape,
    compiling: &mut CompilingSet,
    registry: &'static Registry,
) -> Result<ValueCodec> {
    let (deref, deref_mut) = (object.deref, object.deref_mut);
    let kind = FieldKind::Object(object.type_name);

    let plan = match registry.get(object.type_id) {
        Some(plan) => plan,

        None if compiling.contains(object.type_id) => {
            return Ok(dispatched_object_codec(*object, registry));
        }

        None => compile_object(object, compiling, registry)?,
    };

    let encode_plan = plan.clone();
    let decode_plan = plan.clone();

    Ok(ValueCodec {
        kind,
        min_len: plan.fields.len(),
        encode: encode_fn(move |value, encoder, depth| {
            encode_plan.encode(deref(value), encoder, depth)
        }),
        decode: decode_fn(move |slot, decoder, depth| {
            decode_plan.decode(deref_mut(slot), decoder, depth)
        }),
    })
}

/// The codec of an object whose plan was still being compiled when the
/// reference to it was found. The plan is looked up on every call.
fn dispatched_object_codec(
    object: ObjectShape,
    registry: &'static Registry,
) -> ValueCodec {
    // Every described field costs at least its presence flag.
    let min_len = (object.describe)().fields().len();

    ValueCodec {
        kind: FieldKind::Object(object.type_name),
        min_len,
        encode: encode_fn(move |value, encoder, depth| {
            let plan = registry.plan_for(&object)?;
            plan.encode((object.deref)(value), encoder, depth)
        }),
        decode: decode_fn(move |slot, decoder, depth| {
            let plan = registry.plan_for(&object)?;
            plan.decode((object.deref_mut)(slot), decoder, depth)
        }),
    }
}
