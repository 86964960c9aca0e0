use alloc::format;
use alloc::vec::Vec;
use core::any::Any;

use vc_document::Document;

use super::{Converter, unexpected, wrong_instance};
use crate::registry::{TypeKind, TypeMeta};
use crate::{Error, Serializer};

/// Converter of [`TypeKind::List`] types, written as arrays.
///
/// Items that fail with a recoverable error are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListConverter;

impl Converter for ListConverter {
    fn can_process(&self, meta: &TypeMeta) -> bool {
        matches!(meta.kind(), TypeKind::List(_))
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        let TypeKind::List(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };
        let items = info.items(value).ok_or_else(|| wrong_instance(meta))?;

        let mut array = Vec::with_capacity(items.len());
        for item in items {
            array.push(serializer.serialize(info.item().id(), item)?);
        }
        Ok(Document::Array(array))
    }

    fn deserialize(
        &self,
        serializer: &mut Serializer,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error> {
        let TypeKind::List(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };
        let Some(items) = data.as_array() else {
            return Err(unexpected(meta, data));
        };

        if !info.clear(instance) {
            return Err(wrong_instance(meta));
        }
        for (index, item) in items.iter().enumerate() {
            let mut slot = None;
            if let Err(error) = serializer.deserialize(item, info.item().id(), &mut slot) {
                let context = format!("item {index} of `{}`", meta.name());
                serializer.skip_or_fail(error, &context)?;
                continue;
            }
            if let Some(value) = slot
                && !info.push(instance, value)
            {
                return Err(wrong_instance(meta));
            }
        }
        Ok(())
    }
}
