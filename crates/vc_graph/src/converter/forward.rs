use alloc::format;
use core::any::Any;

use vc_document::Document;

use super::{Converter, wrong_instance};
use crate::registry::{Member, TypeMeta};
use crate::{Error, Serializer};

/// Serializes a struct as one of its members alone.
///
/// Never picked from a pool, only through [`Override::Forward`].
///
/// [`Override::Forward`]: crate::registry::Override::Forward
#[derive(Debug, Clone, Copy)]
pub struct ForwardConverter {
    member: &'static str,
}

impl ForwardConverter {
    #[inline]
    pub const fn new(member: &'static str) -> Self {
        Self { member }
    }

    fn member<'a>(&self, meta: &'a TypeMeta) -> Result<&'a Member, Error> {
        meta.members()
            .iter()
            .find(|member| member.name() == self.member)
            .ok_or_else(|| {
                Error::custom(format!(
                    "`{}` has no member `{}` to forward to",
                    meta.name(),
                    self.member
                ))
            })
    }
}

impl Converter for ForwardConverter {
    fn can_process(&self, _: &TypeMeta) -> bool {
        false
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        let member = self.member(meta)?;
        let field = member.read(value).ok_or_else(|| wrong_instance(meta))?;
        serializer.serialize(member.ty().id(), field)
    }

    fn deserialize(
        &self,
        serializer: &mut Serializer,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error> {
        let member = self.member(meta)?;
        let mut slot = None;
        serializer.deserialize(data, member.ty().id(), &mut slot)?;
        if let Some(value) = slot
            && !member.write(instance, value)
        {
            return Err(wrong_instance(meta));
        }
        Ok(())
    }
}
