use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::mem;

use vc_document::{DEFINITION_KEY, Document, REFERENCE_KEY, TYPE_KEY, VERSION_KEY};

use super::{Serializer, unregistered, wrong_instance};
use crate::cycle::parse_id;
use crate::processor::Processor;
use crate::registry::{Shared, TypeKind, TypeMeta};
use crate::version::VersionedType;
use crate::{Error, Outcome};

impl Serializer {
    /// Deserializes `data` as `ty` into `slot`, reporting every warning.
    ///
    /// An instance already in the slot is populated in place when its type
    /// matches the type being read. Objects keep their identity in that case.
    pub fn try_deserialize(
        &mut self,
        data: &Document,
        ty: TypeId,
        slot: &mut Option<Box<dyn Any>>,
    ) -> Outcome {
        let mark = self.begin_call();
        let result = self.deserialize(data, ty, slot);
        let warnings = self.end_call(mark);
        match result {
            Ok(()) => Outcome::success(warnings),
            Err(error) => Outcome::failure(error, warnings),
        }
    }

    /// Deserializes `data` as `ty` into `slot`.
    ///
    /// This is also the entry point for converters deserializing nested
    /// values. Warnings stay available through
    /// [`take_warnings`](Self::take_warnings).
    pub fn deserialize(
        &mut self,
        data: &Document,
        ty: TypeId,
        slot: &mut Option<Box<dyn Any>>,
    ) -> Result<(), Error> {
        self.begin_call();
        self.references.enter();
        let result = self.deserialize_slot(data, ty, slot);
        self.references.exit();
        result
    }

    /// Deserializes a new `T`.
    pub fn from_document<T: Any>(&mut self, data: &Document) -> Result<T, Error> {
        let mut slot = None;
        self.deserialize(data, TypeId::of::<T>(), &mut slot)?;
        match slot.map(|value| value.downcast::<T>()) {
            Some(Ok(value)) => Ok(*value),
            _ => Err(Error::mismatch(type_name::<T>(), "another type")),
        }
    }

    /// Deserializes into an existing `T`.
    ///
    /// `target` is left at its default value if the call fails before the
    /// instance is handed back.
    pub fn from_document_into<T: Any + Default>(
        &mut self,
        data: &Document,
        target: &mut T,
    ) -> Result<(), Error> {
        let mut slot: Option<Box<dyn Any>> = Some(Box::new(mem::take(target)));
        let result = self.deserialize(data, TypeId::of::<T>(), &mut slot);
        if let Some(value) = slot.and_then(|value| value.downcast::<T>().ok()) {
            *target = *value;
        }
        result
    }

    // Unwraps handles and options down to a value or an object.
    fn deserialize_slot(
        &mut self,
        data: &Document,
        storage: TypeId,
        slot: &mut Option<Box<dyn Any>>,
    ) -> Result<(), Error> {
        let registry = self.registry.clone();
        let meta = registry.get(storage).ok_or_else(|| unregistered(storage))?;

        match meta.kind() {
            TypeKind::Reference(info) => {
                let existing = slot
                    .as_deref()
                    .and_then(|handle| info.as_shared(handle))
                    .cloned();
                let object = self.deserialize_object(data, info.target().id(), existing)?;
                *slot = Some(info.wrap(object));
                Ok(())
            }
            TypeKind::Optional(info) => {
                if data.is_null() {
                    *slot = info.wrap(None);
                    return Ok(());
                }
                let mut inner = slot.take().and_then(|option| info.unwrap(option));
                self.deserialize_slot(data, info.inner().id(), &mut inner)?;
                *slot = info.wrap(inner);
                match slot {
                    Some(_) => Ok(()),
                    None => Err(wrong_instance(meta)),
                }
            }
            _ => {
                let value = self.deserialize_value(data, meta, slot.take())?;
                *slot = Some(value);
                Ok(())
            }
        }
    }

    fn deserialize_object(
        &mut self,
        data: &Document,
        storage: TypeId,
        existing: Option<Shared>,
    ) -> Result<Shared, Error> {
        // References
        if let Some(id) = data.get(REFERENCE_KEY) {
            if data.as_object().is_some_and(|map| map.len() > 1) {
                self.warn(format!("ignoring members next to `{REFERENCE_KEY}`"));
            }
            let id = parse_id(id)?;
            let object = self.references.resolve(id).ok_or(Error::DanglingReference(id))?;
            let runtime = object.content_type();
            if !self.registry.is_assignable(storage, runtime.id()) {
                let expected = self.registry.get(storage).map_or("?", TypeMeta::name);
                return Err(Error::mismatch(
                    format!("a reference to `{expected}`"),
                    format!("object `{id}` of `{}`", runtime.path()),
                ));
            }
            return Ok(object);
        }

        // Versioning. The model to check is the one named by the type tag.
        let model = self.peek_type_tag(data, storage);
        if let Some(path) = self.import_path(data, model)? {
            let object = self.populate_object(data, path[0].model().id(), existing)?;
            for step in path.windows(2) {
                let (from, to) = (&step[0], &step[1]);
                let migrated = to
                    .migration(from.model().id())
                    .is_some_and(|migration| object.migrate(to.model(), migration));
                if !migrated {
                    return Err(migration_failed(from, to));
                }
            }
            return Ok(object);
        }

        // Inheritance
        let runtime = self.resolve_type_tag(data, storage)?;
        self.populate_object(data, runtime, existing)
    }

    fn deserialize_value(
        &mut self,
        data: &Document,
        meta: &TypeMeta,
        existing: Option<Box<dyn Any>>,
    ) -> Result<Box<dyn Any>, Error> {
        if data.get(REFERENCE_KEY).is_some() {
            return Err(Error::mismatch(
                format!("a value of `{}`", meta.name()),
                "an object reference",
            ));
        }

        if let Some(path) = self.import_path(data, meta.type_id())? {
            let mut value = self.populate_value(data, path[0].model().id(), existing)?;
            for step in path.windows(2) {
                let (from, to) = (&step[0], &step[1]);
                value = to
                    .migrate(from.model().id(), value)
                    .map_err(|_| migration_failed(from, to))?;
            }
            return Ok(value);
        }

        self.check_value_tag(data, meta)?;
        self.populate_value(data, meta.type_id(), existing)
    }

    // Instance creation, object registration and converter stages.
    fn populate_object(
        &mut self,
        data: &Document,
        ty: TypeId,
        existing: Option<Shared>,
    ) -> Result<Shared, Error> {
        let registry = self.registry.clone();
        let meta = registry.get(ty).ok_or_else(|| unregistered(ty))?;
        let converter = self.converters.resolve(meta);
        let processors = self.processors_for(meta);
        let data = prepare(data, meta, &processors);

        let object = match existing {
            Some(object) if object.content_type().id() == ty => object,
            _ => Shared::from_boxed(meta.ty(), self.create_instance(&*converter, &data, meta)?),
        };

        if let Some(id) = data.get(DEFINITION_KEY) {
            let id = parse_id(id)?;
            self.references.register(id, object.clone());
        }

        let mut content = object.borrow_any_mut();
        self.convert_deserialize(&*converter, &data, &mut **content, meta)?;
        for processor in processors.iter() {
            processor.after_deserialize(meta, &mut **content);
        }
        drop(content);

        Ok(object)
    }

    fn populate_value(
        &mut self,
        data: &Document,
        ty: TypeId,
        existing: Option<Box<dyn Any>>,
    ) -> Result<Box<dyn Any>, Error> {
        let registry = self.registry.clone();
        let meta = registry.get(ty).ok_or_else(|| unregistered(ty))?;
        let converter = self.converters.resolve(meta);
        let processors = self.processors_for(meta);
        let data = prepare(data, meta, &processors);

        let mut value = match existing {
            Some(value) if (*value).type_id() == ty => value,
            _ => self.create_instance(&*converter, &data, meta)?,
        };

        self.convert_deserialize(&*converter, &data, &mut *value, meta)?;
        for processor in processors.iter() {
            processor.after_deserialize(meta, &mut *value);
        }
        Ok(value)
    }

    // The migration path from the version stored in `data` to `model`, if
    // the two differ.
    fn import_path(
        &mut self,
        data: &Document,
        model: TypeId,
    ) -> Result<Option<Vec<Rc<VersionedType>>>, Error> {
        let Some(version) = data.get(VERSION_KEY) else {
            return Ok(None);
        };
        let Some(version) = version.as_str() else {
            self.warn(format!(
                "ignoring `{VERSION_KEY}` of kind {}, expected a string",
                version.kind()
            ));
            return Ok(None);
        };
        let Some(versioned) = self.versioned_type(model)? else {
            return Ok(None);
        };
        if versioned.version() == version {
            return Ok(None);
        }

        match versioned.import_path(version) {
            Some(path) => Ok(Some(path)),
            None => Err(Error::NoImportPath {
                ty: versioned.model().path(),
                from: version.into(),
                to: versioned.version(),
            }),
        }
    }

    // The type named by a valid type tag, without reporting anything.
    fn peek_type_tag(&self, data: &Document, storage: TypeId) -> TypeId {
        data.get(TYPE_KEY)
            .and_then(Document::as_str)
            .and_then(|name| self.registry.get_with_name(name))
            .map(TypeMeta::type_id)
            .filter(|&candidate| self.registry.is_assignable(storage, candidate))
            .unwrap_or(storage)
    }

    // The runtime type of an object. Invalid tags fall back to `storage`.
    fn resolve_type_tag(&mut self, data: &Document, storage: TypeId) -> Result<TypeId, Error> {
        let Some(tag) = data.get(TYPE_KEY) else {
            return Ok(storage);
        };

        let registry = self.registry.clone();
        let storage_name = registry.get(storage).map_or("?", TypeMeta::name);

        let Some(name) = tag.as_str() else {
            self.soft_fail(Error::InvalidTypeTag(format!(
                "expected a type name, found {}",
                tag.kind()
            )))?;
            return Ok(storage);
        };
        let Some(meta) = registry.get_with_name(name) else {
            self.soft_fail(Error::InvalidTypeTag(format!(
                "unknown type `{name}`, reading as `{storage_name}`"
            )))?;
            return Ok(storage);
        };
        if !registry.is_assignable(storage, meta.type_id()) {
            self.soft_fail(Error::InvalidTypeTag(format!(
                "`{name}` cannot be stored as `{storage_name}`, reading as `{storage_name}`"
            )))?;
            return Ok(storage);
        }
        Ok(meta.type_id())
    }

    // Values are never polymorphic. A tag naming another type is ignored.
    fn check_value_tag(&mut self, data: &Document, meta: &TypeMeta) -> Result<(), Error> {
        match data.get(TYPE_KEY) {
            None => Ok(()),
            Some(Document::String(name)) if name == meta.name() => Ok(()),
            Some(tag) => self.soft_fail(Error::InvalidTypeTag(format!(
                "ignoring `{}` on a value of `{}`",
                tag.as_str().unwrap_or(tag.kind()),
                meta.name()
            ))),
        }
    }
}

// Runs `before_deserialize` on a private copy of the document.
fn prepare<'a>(
    data: &'a Document,
    meta: &TypeMeta,
    processors: &[Rc<dyn Processor>],
) -> Cow<'a, Document> {
    if processors.is_empty() {
        return Cow::Borrowed(data);
    }
    let mut copy = data.clone();
    for processor in processors {
        processor.before_deserialize(meta, &mut copy);
    }
    Cow::Owned(copy)
}

fn migration_failed(from: &VersionedType, to: &VersionedType) -> Error {
    Error::MigrationFailed {
        from: from.model().path(),
        to: to.model().path(),
    }
}

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use crate::registry::Ref;
    use crate::serializer::tests::*;
    use crate::{Error, SerializerBuilder};

    #[test]
    fn deserialize_in_place_keeps_identity() {
        let mut serializer = serializer();
        let original = Ref::new(Leaf { value: 1 });
        let mut target = original.clone();

        serializer
            .from_document_into(&parse(r#"{"value":9}"#), &mut target)
            .unwrap();

        assert!(Ref::ptr_eq(&original, &target));
        assert_eq!(original.borrow().unwrap().value, 9);
    }

    // -------------------------------------------------------------------------
    // References

    #[test]
    fn broken_references() {
        let mut serializer = serializer();

        let dangling = serializer.from_document::<Ref<Leaf>>(&parse(r#"{"$ref":"5"}"#));
        assert!(matches!(dangling, Err(Error::DanglingReference(5))));

        let malformed = serializer.from_document::<Ref<Leaf>>(&parse(r#"{"$ref":"five"}"#));
        assert!(matches!(malformed, Err(Error::MalformedReferenceId(_))));

        let on_value = serializer.from_document::<Leaf>(&parse(r#"{"$ref":"0"}"#));
        assert!(matches!(on_value, Err(Error::Mismatch { .. })));
    }

    #[test]
    fn members_next_to_reference_are_ignored() {
        let mut serializer = serializer();
        let doc = parse(r#"{"left":{"$id":"0","value":1},"right":{"$ref":"0","value":9}}"#);

        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, TypeId::of::<Pair>(), &mut slot);
        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings().len(), 1);

        let pair = slot.unwrap().downcast::<Pair>().unwrap();
        assert!(Ref::ptr_eq(&pair.left, &pair.right));
        assert_eq!(pair.right.borrow().unwrap().value, 1);
    }

    #[test]
    fn reference_of_another_type_is_skipped() {
        let doc = parse(r#"{"animal":{"$id":"0","name":"x"},"leaf":{"$ref":"0"}}"#);
        let ty = TypeId::of::<Mixed>();

        let mut serializer = serializer();
        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, ty, &mut slot);
        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings().len(), 1);
        assert!(outcome.warnings()[0].contains("member `leaf`"));

        let mixed = slot.unwrap().downcast::<Mixed>().unwrap();
        assert_eq!(mixed.animal.borrow().unwrap().name, "x");
        assert_eq!(mixed.leaf.borrow().unwrap().value, 0);

        let mut serializer = SerializerBuilder::new(registry()).config(strict()).build();
        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, ty, &mut slot);
        assert!(matches!(outcome.error(), Some(Error::Mismatch { .. })));
    }

    #[test]
    fn reference_to_a_subtype_is_accepted() {
        let mut serializer = serializer();
        let doc = parse(
            r#"{"animals":[{"$id":"0","$type":"Dog","good":true,"name":"Rex"},{"$ref":"0"}]}"#,
        );

        let zoo = serializer.from_document::<Zoo>(&doc).unwrap();
        assert!(Ref::ptr_eq(&zoo.animals[0], &zoo.animals[1]));
        assert!(zoo.animals[1].shared().is::<Dog>());
    }

    // -------------------------------------------------------------------------
    // Inheritance

    #[test]
    fn unknown_type_tag_falls_back() {
        let doc = parse(r#"{"$type":"Ghost","name":"Boo"}"#);
        let ty = TypeId::of::<Ref<Animal>>();

        let mut serializer = serializer();
        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, ty, &mut slot);
        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings().len(), 1);
        let animal = slot.unwrap().downcast::<Ref<Animal>>().unwrap();
        assert_eq!(animal.borrow().unwrap().name, "Boo");

        let mut serializer = SerializerBuilder::new(registry()).config(strict()).build();
        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, ty, &mut slot);
        assert!(matches!(outcome.error(), Some(Error::InvalidTypeTag(_))));
    }

    #[test]
    fn tag_outside_the_hierarchy_is_rejected() {
        let mut serializer = serializer();
        let doc = parse(r#"{"$type":"Leaf","name":"Boo"}"#);

        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, TypeId::of::<Ref<Animal>>(), &mut slot);
        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings().len(), 1);
        let animal = slot.unwrap().downcast::<Ref<Animal>>().unwrap();
        assert!(animal.shared().is::<Animal>());
    }

    // -------------------------------------------------------------------------
    // Versioning

    #[test]
    fn old_versions_are_migrated() {
        let mut serializer = serializer();
        let doc = parse(r#"{"$version":"1","strength":3}"#);

        let value = serializer.from_document::<Potion>(&doc).unwrap();
        assert_eq!(value, Potion { potency: 6 });

        let object = serializer.from_document::<Ref<Potion>>(&doc).unwrap();
        assert_eq!(object.borrow().unwrap().potency, 6);
    }

    #[test]
    fn unknown_version_has_no_import_path() {
        let mut serializer = serializer();
        let result =
            serializer.from_document::<Potion>(&parse(r#"{"$version":"9","potency":1}"#));
        match result {
            Err(Error::NoImportPath { from, to, .. }) => {
                assert_eq!(from, "9");
                assert_eq!(to, "2");
            }
            other => panic!("expected a missing import path, got {other:?}"),
        }
    }

    // -------------------------------------------------------------------------
    // Recoverable problems

    #[test]
    fn bad_member_is_skipped() {
        let doc = parse(r#"{"value":"many"}"#);
        let ty = TypeId::of::<Leaf>();

        let mut serializer = serializer();
        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, ty, &mut slot);
        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings().len(), 1);
        assert!(outcome.warnings()[0].contains("member `value`"));
        assert_eq!(slot.unwrap().downcast::<Leaf>().unwrap().value, 0);

        let mut serializer = SerializerBuilder::new(registry()).config(strict()).build();
        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, ty, &mut slot);
        assert!(matches!(outcome.error(), Some(Error::Mismatch { .. })));
    }
}
