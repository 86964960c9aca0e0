use alloc::format;
use alloc::string::String;
use core::any::Any;

use vc_document::{Document, Map, is_reserved_key};

use super::{Converter, unexpected, wrong_instance};
use crate::registry::{TypeKind, TypeMeta};
use crate::{Error, Serializer};

/// Converter of [`TypeKind::Map`] types, written as objects.
///
/// Reserved keys are never read back as entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapConverter;

impl Converter for MapConverter {
    fn can_process(&self, meta: &TypeMeta) -> bool {
        matches!(meta.kind(), TypeKind::Map(_))
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        let TypeKind::Map(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };
        let entries = info.entries(value).ok_or_else(|| wrong_instance(meta))?;

        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(String::from(key), serializer.serialize(info.value().id(), value)?);
        }
        Ok(Document::Object(map))
    }

    fn deserialize(
        &self,
        serializer: &mut Serializer,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error> {
        let TypeKind::Map(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };
        let Some(map) = data.as_object() else {
            return Err(unexpected(meta, data));
        };

        if !info.clear(instance) {
            return Err(wrong_instance(meta));
        }
        for (key, item) in map.iter().filter(|(key, _)| !is_reserved_key(key)) {
            let mut slot = None;
            if let Err(error) = serializer.deserialize(item, info.value().id(), &mut slot) {
                let context = format!("entry `{key}` of `{}`", meta.name());
                serializer.skip_or_fail(error, &context)?;
                continue;
            }
            if let Some(value) = slot
                && !info.insert(instance, key.clone(), value)
            {
                return Err(wrong_instance(meta));
            }
        }
        Ok(())
    }
}
