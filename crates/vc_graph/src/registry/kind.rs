use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use super::{Ref, Shared, Type};

// -----------------------------------------------------------------------------
// TypeKind

/// The shape of a registered type, as far as the built-in converters care.
#[derive(Debug)]
pub enum TypeKind {
    /// A leaf value. Needs a dedicated converter.
    Primitive,
    /// A struct with named members.
    Struct(StructInfo),
    /// A `Vec<T>`.
    List(ListInfo),
    /// A `BTreeMap<String, T>`.
    Map(MapInfo),
    /// An `Option<T>`, serialized as the item or as `null`.
    Optional(OptionInfo),
    /// A fieldless enum.
    Enum(EnumInfo),
    /// A handle to a [`Shared`] object, such as [`Ref<T>`] or `Shared` itself.
    Reference(RefInfo),
}

impl TypeKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Struct(_) => "struct",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Optional(_) => "option",
            Self::Enum(_) => "enum",
            Self::Reference(_) => "reference",
        }
    }
}

// -----------------------------------------------------------------------------
// Member

trait Accessor {
    fn read<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;

    fn write(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> bool;
}

struct FieldAccessor<S, F> {
    read: fn(&S) -> &F,
    write: fn(&mut S) -> &mut F,
}

impl<S: Any, F: Any> Accessor for FieldAccessor<S, F> {
    fn read<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let owner = owner.downcast_ref::<S>()?;
        Some((self.read)(owner))
    }

    fn write(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> bool {
        match (owner.downcast_mut::<S>(), value.downcast::<F>()) {
            (Some(owner), Ok(value)) => {
                *(self.write)(owner) = *value;
                true
            }
            _ => false,
        }
    }
}

/// A named, readable and writable member of a struct.
///
/// # Examples
///
/// ```
/// use vc_graph::registry::Member;
///
/// #[derive(Default)]
/// struct Point { x: i32 }
///
/// let member = Member::new::<Point, i32>("x", |p| &p.x, |p| &mut p.x);
///
/// let mut point = Point { x: 1 };
/// assert!(member.write(&mut point, Box::new(7_i32)));
/// assert_eq!(member.read(&point).and_then(|v| v.downcast_ref::<i32>()), Some(&7));
/// ```
pub struct Member {
    name: &'static str,
    ty: Type,
    accessor: Box<dyn Accessor>,
}

impl Member {
    pub fn new<S: Any, F: Any>(
        name: &'static str,
        read: fn(&S) -> &F,
        write: fn(&mut S) -> &mut F,
    ) -> Self {
        Self {
            name,
            ty: Type::of::<F>(),
            accessor: Box::new(FieldAccessor { read, write }),
        }
    }

    /// The declared member name, before any [`NameStyle`](crate::NameStyle) applies.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The declared type of the member, used as storage type.
    #[inline]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    /// Returns `None` if `owner` is not the struct this member belongs to.
    #[inline]
    pub fn read<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        self.accessor.read(owner)
    }

    /// Returns `false` if either the owner or the value has the wrong type.
    #[inline]
    pub fn write(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> bool {
        self.accessor.write(owner, value)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// StructInfo

#[derive(Debug)]
pub struct StructInfo {
    members: Vec<Member>,
}

impl StructInfo {
    pub fn new(members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    #[inline]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

// -----------------------------------------------------------------------------
// ListInfo

/// Erased access to a `Vec<T>`.
pub struct ListInfo {
    item: Type,
    items: fn(&dyn Any) -> Option<Vec<&dyn Any>>,
    clear: fn(&mut dyn Any) -> bool,
    push: fn(&mut dyn Any, Box<dyn Any>) -> bool,
}

impl ListInfo {
    pub fn of<T: Any>() -> Self {
        fn items<T: Any>(list: &dyn Any) -> Option<Vec<&dyn Any>> {
            let list = list.downcast_ref::<Vec<T>>()?;
            Some(list.iter().map(|item| item as &dyn Any).collect())
        }

        fn clear<T: Any>(list: &mut dyn Any) -> bool {
            list.downcast_mut::<Vec<T>>().map(Vec::clear).is_some()
        }

        fn push<T: Any>(list: &mut dyn Any, item: Box<dyn Any>) -> bool {
            match (list.downcast_mut::<Vec<T>>(), item.downcast::<T>()) {
                (Some(list), Ok(item)) => {
                    list.push(*item);
                    true
                }
                _ => false,
            }
        }

        Self {
            item: Type::of::<T>(),
            items: items::<T>,
            clear: clear::<T>,
            push: push::<T>,
        }
    }

    #[inline]
    pub const fn item(&self) -> Type {
        self.item
    }

    #[inline]
    pub fn items<'a>(&self, list: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        (self.items)(list)
    }

    #[inline]
    pub fn clear(&self, list: &mut dyn Any) -> bool {
        (self.clear)(list)
    }

    #[inline]
    pub fn push(&self, list: &mut dyn Any, item: Box<dyn Any>) -> bool {
        (self.push)(list, item)
    }
}

impl fmt::Debug for ListInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListInfo").field("item", &self.item).finish()
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// Erased access to a `BTreeMap<String, T>`.
pub struct MapInfo {
    value: Type,
    entries: fn(&dyn Any) -> Option<Vec<(&str, &dyn Any)>>,
    clear: fn(&mut dyn Any) -> bool,
    insert: fn(&mut dyn Any, String, Box<dyn Any>) -> bool,
}

impl MapInfo {
    pub fn of<T: Any>() -> Self {
        fn entries<T: Any>(map: &dyn Any) -> Option<Vec<(&str, &dyn Any)>> {
            let map = map.downcast_ref::<BTreeMap<String, T>>()?;
            Some(
                map.iter()
                    .map(|(key, value)| (key.as_str(), value as &dyn Any))
                    .collect(),
            )
        }

        fn clear<T: Any>(map: &mut dyn Any) -> bool {
            map.downcast_mut::<BTreeMap<String, T>>()
                .map(BTreeMap::clear)
                .is_some()
        }

        fn insert<T: Any>(map: &mut dyn Any, key: String, value: Box<dyn Any>) -> bool {
            match (map.downcast_mut::<BTreeMap<String, T>>(), value.downcast::<T>()) {
                (Some(map), Ok(value)) => {
                    map.insert(key, *value);
                    true
                }
                _ => false,
            }
        }

        Self {
            value: Type::of::<T>(),
            entries: entries::<T>,
            clear: clear::<T>,
            insert: insert::<T>,
        }
    }

    #[inline]
    pub const fn value(&self) -> Type {
        self.value
    }

    #[inline]
    pub fn entries<'a>(&self, map: &'a dyn Any) -> Option<Vec<(&'a str, &'a dyn Any)>> {
        (self.entries)(map)
    }

    #[inline]
    pub fn clear(&self, map: &mut dyn Any) -> bool {
        (self.clear)(map)
    }

    #[inline]
    pub fn insert(&self, map: &mut dyn Any, key: String, value: Box<dyn Any>) -> bool {
        (self.insert)(map, key, value)
    }
}

impl fmt::Debug for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapInfo").field("value", &self.value).finish()
    }
}

// -----------------------------------------------------------------------------
// OptionInfo

/// Erased access to an `Option<T>`.
pub struct OptionInfo {
    inner: Type,
    get: fn(&dyn Any) -> Option<Option<&dyn Any>>,
    wrap: fn(Option<Box<dyn Any>>) -> Option<Box<dyn Any>>,
    unwrap: fn(Box<dyn Any>) -> Option<Box<dyn Any>>,
}

impl OptionInfo {
    pub fn of<T: Any>() -> Self {
        fn get<T: Any>(option: &dyn Any) -> Option<Option<&dyn Any>> {
            let option = option.downcast_ref::<Option<T>>()?;
            Some(option.as_ref().map(|v| v as &dyn Any))
        }

        fn wrap<T: Any>(inner: Option<Box<dyn Any>>) -> Option<Box<dyn Any>> {
            let option: Option<T> = match inner {
                Some(inner) => Some(*inner.downcast::<T>().ok()?),
                None => None,
            };
            Some(Box::new(option))
        }

        fn unwrap<T: Any>(option: Box<dyn Any>) -> Option<Box<dyn Any>> {
            let option = option.downcast::<Option<T>>().ok()?;
            option.map(|v| Box::new(v) as Box<dyn Any>)
        }

        Self {
            inner: Type::of::<T>(),
            get: get::<T>,
            wrap: wrap::<T>,
            unwrap: unwrap::<T>,
        }
    }

    #[inline]
    pub const fn inner(&self) -> Type {
        self.inner
    }

    /// Returns `None` if `option` has the wrong type.
    #[inline]
    pub fn get<'a>(&self, option: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        (self.get)(option)
    }

    /// Builds a boxed `Option<T>`. Returns `None` if `inner` is not a `T`.
    #[inline]
    pub fn wrap(&self, inner: Option<Box<dyn Any>>) -> Option<Box<dyn Any>> {
        (self.wrap)(inner)
    }

    /// Takes the item out of a boxed `Option<T>`.
    #[inline]
    pub fn unwrap(&self, option: Box<dyn Any>) -> Option<Box<dyn Any>> {
        (self.unwrap)(option)
    }
}

impl fmt::Debug for OptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionInfo").field("inner", &self.inner).finish()
    }
}

// -----------------------------------------------------------------------------
// EnumInfo

/// Erased access to a fieldless enum, by variant index.
pub struct EnumInfo {
    variants: &'static [&'static str],
    index_of: fn(&dyn Any) -> Option<usize>,
    set_index: fn(&mut dyn Any, usize) -> bool,
}

impl EnumInfo {
    pub const fn new(
        variants: &'static [&'static str],
        index_of: fn(&dyn Any) -> Option<usize>,
        set_index: fn(&mut dyn Any, usize) -> bool,
    ) -> Self {
        Self {
            variants,
            index_of,
            set_index,
        }
    }

    #[inline]
    pub const fn variants(&self) -> &'static [&'static str] {
        self.variants
    }

    #[inline]
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| *v == name)
    }

    #[inline]
    pub fn index_of(&self, value: &dyn Any) -> Option<usize> {
        (self.index_of)(value)
    }

    /// Returns `false` if the index is out of range or the value has the wrong type.
    #[inline]
    pub fn set_index(&self, value: &mut dyn Any, index: usize) -> bool {
        (self.set_index)(value, index)
    }
}

impl fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumInfo")
            .field("variants", &self.variants)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// RefInfo

/// Erased access to an object handle.
pub struct RefInfo {
    target: Type,
    as_shared: fn(&dyn Any) -> Option<&Shared>,
    wrap: fn(Shared) -> Box<dyn Any>,
}

impl RefInfo {
    /// Describes [`Ref<T>`].
    pub fn of<T: Any>() -> Self {
        fn as_shared<T: Any>(handle: &dyn Any) -> Option<&Shared> {
            handle.downcast_ref::<Ref<T>>().map(Ref::shared)
        }

        fn wrap<T: Any>(shared: Shared) -> Box<dyn Any> {
            Box::new(Ref::<T>::from_shared(shared))
        }

        Self {
            target: Type::of::<T>(),
            as_shared: as_shared::<T>,
            wrap: wrap::<T>,
        }
    }

    /// Describes [`Shared`], whose target accepts any object.
    pub fn erased() -> Self {
        fn as_shared(handle: &dyn Any) -> Option<&Shared> {
            handle.downcast_ref::<Shared>()
        }

        fn wrap(shared: Shared) -> Box<dyn Any> {
            Box::new(shared)
        }

        Self {
            target: Type::of::<Shared>(),
            as_shared,
            wrap,
        }
    }

    /// The declared storage type of the referenced object.
    #[inline]
    pub const fn target(&self) -> Type {
        self.target
    }

    #[inline]
    pub fn as_shared<'a>(&self, handle: &'a dyn Any) -> Option<&'a Shared> {
        (self.as_shared)(handle)
    }

    #[inline]
    pub fn wrap(&self, shared: Shared) -> Box<dyn Any> {
        (self.wrap)(shared)
    }
}

impl fmt::Debug for RefInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefInfo").field("target", &self.target).finish()
    }
}
