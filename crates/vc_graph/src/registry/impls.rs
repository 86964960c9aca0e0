use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use super::{GetTypeMeta, ListInfo, MapInfo, OptionInfo, Ref, RefInfo, TypeKind};
use super::{TypeMeta, TypeRegistry, default_instance};

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl GetTypeMeta for $ty {
                fn get_type_meta() -> TypeMeta {
                    TypeMeta::of::<Self>(TypeKind::Primitive)
                        .with_constructor(default_instance::<Self>)
                        .sealed()
                }
            }
        )*
    };
}

impl_primitive!(
    (), bool, char, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, String,
);

impl<T: GetTypeMeta> GetTypeMeta for Vec<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>(TypeKind::List(ListInfo::of::<T>()))
            .with_constructor(default_instance::<Self>)
            .sealed()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

impl<T: GetTypeMeta> GetTypeMeta for BTreeMap<String, T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>(TypeKind::Map(MapInfo::of::<T>()))
            .with_constructor(default_instance::<Self>)
            .sealed()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

impl<T: GetTypeMeta> GetTypeMeta for Option<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>(TypeKind::Optional(OptionInfo::of::<T>()))
            .with_constructor(default_instance::<Self>)
            .sealed()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

impl<T: GetTypeMeta> GetTypeMeta for Ref<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>(TypeKind::Reference(RefInfo::of::<T>())).sealed()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}
