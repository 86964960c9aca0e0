use core::any::Any;

use vc_document::Document;

use super::{Converter, unexpected, wrong_instance};
use crate::registry::{TypeKind, TypeMeta};
use crate::{Error, Serializer};

/// Converter of fieldless enums.
///
/// Writes the variant name, or the variant index when
/// [`Config::enums_as_integers`](crate::Config::enums_as_integers) is set.
/// Both forms are accepted when reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumConverter;

impl Converter for EnumConverter {
    fn can_process(&self, meta: &TypeMeta) -> bool {
        matches!(meta.kind(), TypeKind::Enum(_))
    }

    fn request_cycle_support(&self, _: &TypeMeta) -> bool {
        false
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        let TypeKind::Enum(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };
        let index = info.index_of(value).ok_or_else(|| wrong_instance(meta))?;

        if serializer.config().enums_as_integers {
            return Ok(Document::from(index as u64));
        }
        match info.variants().get(index) {
            Some(name) => Ok(Document::from(*name)),
            None => Err(wrong_instance(meta)),
        }
    }

    fn deserialize(
        &self,
        _: &mut Serializer,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error> {
        let TypeKind::Enum(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };

        let index = match data {
            Document::String(name) => info.index_of_name(name),
            Document::Number(number) => number.as_u64().and_then(|v| usize::try_from(v).ok()),
            _ => None,
        };
        match index {
            Some(index) if index < info.variants().len() => {
                if info.set_index(instance, index) {
                    Ok(())
                } else {
                    Err(wrong_instance(meta))
                }
            }
            _ => Err(unexpected(meta, data)),
        }
    }
}
