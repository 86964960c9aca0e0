use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use super::{Converter, EnumConverter, ForwardConverter, ListConverter, MapConverter};
use super::{Primitive, PrimitiveConverter, ReflectedConverter};
use crate::hash::TypeIdMap;
use crate::registry::{Override, TypeMeta};

// -----------------------------------------------------------------------------
// ConverterRegistry

/// Picks the converter of each type and caches the choice.
///
/// Resolution order for a type:
///
/// 1. an override registered with [`set_override`](Self::set_override),
/// 2. the override declared on the type, see [`TypeMeta::attribute_override`],
/// 3. the direct pool, an exact lookup by [`TypeId`],
/// 4. the general pool, asking each converter from the most recently added
///    to the oldest.
///
/// Any change invalidates the cache.
///
/// # Panics
///
/// [`resolve`](Self::resolve) panics if nothing accepts a type. A catch-all
/// converter such as [`ReflectedConverter`] must be added first.
pub struct ConverterRegistry {
    direct: TypeIdMap<Rc<dyn Converter>>,
    general: Vec<Rc<dyn Converter>>,
    overrides: TypeIdMap<Override>,
    cache: TypeIdMap<Rc<dyn Converter>>,
}

impl Default for ConverterRegistry {
    /// See [`ConverterRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// An empty registry, without the catch-all converter.
    pub fn empty() -> Self {
        Self {
            direct: TypeIdMap::default(),
            general: Vec::new(),
            overrides: TypeIdMap::default(),
            cache: TypeIdMap::default(),
        }
    }

    /// A registry with every built-in converter.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.add(ReflectedConverter);
        registry.add(ListConverter);
        registry.add(MapConverter);
        registry.add(EnumConverter);

        registry.add_primitive::<()>();
        registry.add_primitive::<bool>();
        registry.add_primitive::<char>();
        registry.add_primitive::<u8>();
        registry.add_primitive::<u16>();
        registry.add_primitive::<u32>();
        registry.add_primitive::<u64>();
        registry.add_primitive::<usize>();
        registry.add_primitive::<i8>();
        registry.add_primitive::<i16>();
        registry.add_primitive::<i32>();
        registry.add_primitive::<i64>();
        registry.add_primitive::<isize>();
        registry.add_primitive::<f32>();
        registry.add_primitive::<f64>();
        registry.add_primitive::<String>();
        registry
    }

    /// Adds a converter to the general pool. It takes precedence over every
    /// converter added before.
    pub fn add(&mut self, converter: impl Converter + 'static) {
        self.general.push(Rc::new(converter));
        self.cache.clear();
    }

    /// Adds a converter used for exactly `T`.
    pub fn add_direct<T: Any>(&mut self, converter: impl Converter + 'static) {
        self.direct.insert(TypeId::of::<T>(), Rc::new(converter));
        self.cache.clear();
    }

    #[inline]
    pub fn add_primitive<T: Primitive>(&mut self) {
        self.add_direct::<T>(PrimitiveConverter::<T>::new());
    }

    pub fn set_override<T: Any>(&mut self, choice: Override) {
        self.overrides.insert(TypeId::of::<T>(), choice);
        self.cache.clear();
    }

    /// Returns the converter for the described type.
    pub fn resolve(&mut self, meta: &TypeMeta) -> Rc<dyn Converter> {
        let type_id = meta.type_id();
        if let Some(converter) = self.cache.get(&type_id) {
            return converter.clone();
        }

        let choice = self
            .overrides
            .get(&type_id)
            .or_else(|| meta.attribute_override());
        let converter: Rc<dyn Converter> = match choice {
            Some(Override::Converter(converter)) => converter.clone(),
            Some(Override::Forward(member)) => Rc::new(ForwardConverter::new(*member)),
            None => match self.direct.get(&type_id) {
                Some(converter) => converter.clone(),
                None => self
                    .general
                    .iter()
                    .rev()
                    .find(|converter| converter.can_process(meta))
                    .cloned()
                    .unwrap_or_else(|| {
                        panic!(
                            "no converter accepts `{}`, the general pool must start with a catch-all converter",
                            meta.name()
                        )
                    }),
            },
        };

        self.cache.insert(type_id, converter.clone());
        converter
    }
}
