use alloc::format;
use alloc::string::String;
use core::any::Any;

use vc_document::{Document, Map};

use super::{Converter, unexpected, wrong_instance};
use crate::registry::{TypeKind, TypeMeta};
use crate::{Error, Serializer};

/// The catch-all converter.
///
/// Writes a struct as an object with one entry per [`Member`], named after
/// [`Config::member_names`]. Members missing from a document keep the value
/// of the created instance. Unknown document entries are ignored.
///
/// Every other kind of type is rejected with [`Error::Unsupported`], which
/// is what leaf types without a dedicated converter end up with.
///
/// [`Member`]: crate::registry::Member
/// [`Config::member_names`]: crate::Config::member_names
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflectedConverter;

impl Converter for ReflectedConverter {
    fn can_process(&self, _: &TypeMeta) -> bool {
        true
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        let TypeKind::Struct(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };

        let style = serializer.config().member_names;
        let mut map = Map::new();
        for member in info.members() {
            let field = member.read(value).ok_or_else(|| wrong_instance(meta))?;
            let data = serializer.serialize(member.ty().id(), field)?;
            map.insert(String::from(style.apply(member.name())), data);
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
        let TypeKind::Struct(info) = meta.kind() else {
            return Err(Error::Unsupported(meta.name().into()));
        };
        let Some(map) = data.as_object() else {
            return Err(unexpected(meta, data));
        };

        let style = serializer.config().member_names;
        for member in info.members() {
            let key = style.apply(member.name());
            let Some(item) = map.get(key.as_ref()) else {
                continue;
            };

            let mut slot = None;
            if let Err(error) = serializer.deserialize(item, member.ty().id(), &mut slot) {
                let context = format!("member `{key}` of `{}`", meta.name());
                serializer.skip_or_fail(error, &context)?;
                continue;
            }
            if let Some(value) = slot
                && !member.write(instance, value)
            {
                return Err(wrong_instance(meta));
            }
        }
        Ok(())
    }
}
