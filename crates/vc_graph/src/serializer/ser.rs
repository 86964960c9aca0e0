use alloc::string::String;
use core::any::{Any, TypeId};

use vc_document::{Document, TYPE_KEY, VERSION_KEY};

use super::{Serializer, unregistered, wrong_instance};
use crate::cycle::{has_identity, wrap_content};
use crate::registry::{Shared, TypeKind, TypeMeta};
use crate::{Error, Outcome};

impl Serializer {
    /// Serializes `value`, declared as `ty`, reporting every warning.
    ///
    /// On hard failure the returned document is `null`.
    pub fn try_serialize(&mut self, ty: TypeId, value: &dyn Any) -> (Outcome, Document) {
        let mark = self.begin_call();
        let result = self.serialize(ty, value);
        let warnings = self.end_call(mark);
        match result {
            Ok(data) => (Outcome::success(warnings), data),
            Err(error) => (Outcome::failure(error, warnings), Document::Null),
        }
    }

    /// Serializes `value`, declared as `ty`.
    ///
    /// This is also the entry point for converters serializing nested values.
    /// Warnings stay available through [`take_warnings`](Self::take_warnings).
    pub fn serialize(&mut self, ty: TypeId, value: &dyn Any) -> Result<Document, Error> {
        self.begin_call();
        self.references.enter();
        let mut result = self.serialize_slot(ty, value);
        if self.references.exit() {
            match &mut result {
                Ok(data) => self.lazy.finish(data),
                Err(_) => self.lazy.clear(),
            }
        }
        result
    }

    /// Serializes a `T`.
    #[inline]
    pub fn to_document<T: Any>(&mut self, value: &T) -> Result<Document, Error> {
        self.serialize(TypeId::of::<T>(), value)
    }

    // Unwraps handles and options down to a value or an object.
    fn serialize_slot(&mut self, storage: TypeId, value: &dyn Any) -> Result<Document, Error> {
        let registry = self.registry.clone();
        let meta = registry.get(storage).ok_or_else(|| unregistered(storage))?;

        match meta.kind() {
            TypeKind::Reference(info) => {
                let shared = info.as_shared(value).ok_or_else(|| wrong_instance(meta))?;
                self.serialize_object(info.target().id(), shared)
            }
            TypeKind::Optional(info) => match info.get(value) {
                Some(Some(inner)) => self.serialize_slot(info.inner().id(), inner),
                Some(None) => Ok(Document::Null),
                None => Err(wrong_instance(meta)),
            },
            _ if value.type_id() == storage => self.serialize_instance(meta, meta, value),
            _ => Err(wrong_instance(meta)),
        }
    }

    // Cycle stage.
    fn serialize_object(&mut self, storage: TypeId, object: &Shared) -> Result<Document, Error> {
        let registry = self.registry.clone();
        let storage_meta = registry.get(storage).ok_or_else(|| unregistered(storage))?;
        let runtime = object.content_type();
        let meta = registry
            .get(runtime.id())
            .ok_or_else(|| Error::Unregistered(String::from(runtime.path())))?;

        let converter = self.converters.resolve(meta);
        if !converter.request_cycle_support(meta) {
            let content = object.borrow_any();
            return self.serialize_instance(storage_meta, meta, &**content);
        }

        if self.references.is_marked(object) {
            let id = self.references.reference_id(object);
            return Ok(self.lazy.reference(id));
        }

        let id = self.references.mark(object);
        let content = object.borrow_any();
        let data = self.serialize_instance(storage_meta, meta, &**content)?;
        Ok(self.lazy.define(id, data))
    }

    // Processors, then the inheritance, versioning and converter stages.
    fn serialize_instance(
        &mut self,
        storage: &TypeMeta,
        meta: &TypeMeta,
        value: &dyn Any,
    ) -> Result<Document, Error> {
        let processors = self.processors_for(meta);
        for processor in processors.iter() {
            processor.before_serialize(meta, value);
        }

        let versioned = self.versioned_type(meta.type_id())?;
        let converter = self.converters.resolve(meta);
        let mut data = self.convert_serialize(&*converter, value, meta)?;

        let tagged = storage.type_id() != meta.type_id()
            && self
                .converters
                .resolve(storage)
                .request_inheritance_support(storage);
        if (tagged || versioned.is_some()) && has_identity(&data) {
            data = wrap_content(data);
        }

        if let Some(versioned) = versioned {
            data.ensure_object()
                .insert(String::from(VERSION_KEY), Document::from(versioned.version()));
        }
        if tagged {
            data.ensure_object()
                .insert(String::from(TYPE_KEY), Document::from(meta.name()));
        }

        for processor in processors.iter() {
            processor.after_serialize(meta, value, &mut data);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::TypeId;

    use vc_document::Document;

    use crate::registry::{Ref, Shared, TypeRegistry};
    use crate::serializer::tests::*;
    use crate::version::VersionError;
    use crate::{Config, Describe, Error, NameStyle, Serializer, SerializerBuilder};

    #[test]
    fn value_round_trip() {
        let mut serializer = serializer();
        let stats = Stats {
            max_hit_points: 10,
            ratio: 0.5,
            title: "knight".into(),
            tags: vec!["brave".into()],
            mood: Mood::Furious,
            note: None,
        };

        let doc = serializer.to_document(&stats).unwrap();
        assert_eq!(
            json(&doc),
            r#"{"max_hit_points":10,"mood":"Furious","note":null,"ratio":0.5,"tags":["brave"],"title":"knight"}"#
        );
        assert_eq!(serializer.from_document::<Stats>(&doc).unwrap(), stats);
    }

    #[test]
    fn member_names_and_enum_indexes() {
        let mut serializer = SerializerBuilder::new(registry())
            .config(Config {
                member_names: NameStyle::CamelCase,
                enums_as_integers: true,
                ..Config::default()
            })
            .build();
        let stats = Stats {
            max_hit_points: 3,
            mood: Mood::Furious,
            note: Some("hi".into()),
            ..Stats::default()
        };

        let doc = serializer.to_document(&stats).unwrap();
        assert_eq!(doc.get("maxHitPoints"), Some(&Document::from(3_i64)));
        assert_eq!(doc.get("mood"), Some(&Document::from(1_i64)));
        assert_eq!(doc.get("max_hit_points"), None);
        assert_eq!(serializer.from_document::<Stats>(&doc).unwrap(), stats);
    }

    #[test]
    fn unregistered_type_fails() {
        struct Stranger;

        let mut serializer = serializer();
        let (outcome, doc) = serializer.try_serialize(TypeId::of::<Stranger>(), &Stranger);
        assert!(matches!(outcome.error(), Some(Error::Unregistered(_))));
        assert!(doc.is_null());
    }

    // -------------------------------------------------------------------------
    // Identity

    #[test]
    fn shared_objects_keep_identity() {
        let mut serializer = serializer();
        let leaf = Ref::new(Leaf { value: 7 });
        let pair = Pair {
            left: leaf.clone(),
            right: leaf,
        };

        let doc = serializer.to_document(&pair).unwrap();
        assert_eq!(
            json(&doc),
            r#"{"left":{"$id":"0","value":7},"right":{"$ref":"0"}}"#
        );

        let back = serializer.from_document::<Pair>(&doc).unwrap();
        assert!(Ref::ptr_eq(&back.left, &back.right));
        assert_eq!(back.left.borrow().unwrap().value, 7);
    }

    #[test]
    fn no_state_leaks_between_calls() {
        let mut serializer = serializer();
        let holder = Holder::default();

        let first = serializer.to_document(&holder).unwrap();
        let second = serializer.to_document(&holder).unwrap();
        assert_eq!(json(&first), r#"{"value":{}}"#);
        assert_eq!(first, second);

        let shared = Ref::new(Empty);
        let holders = vec![
            Holder {
                value: shared.clone(),
            },
            Holder { value: shared },
        ];
        let doc = serializer.to_document(&holders).unwrap();
        assert_eq!(
            json(&doc),
            r#"[{"value":{"$id":"0"}},{"value":{"$ref":"0"}}]"#
        );
    }

    #[test]
    fn user_keys_are_written_as_is() {
        let mut serializer = serializer();
        let tally = Tally {
            counts: [(String::from("$pending"), 0_u64)].into_iter().collect(),
            leaf: Ref::new(Leaf { value: 5 }),
        };

        let doc = serializer.to_document(&tally).unwrap();
        assert_eq!(
            json(&doc),
            r#"{"counts":{"$pending":0},"leaf":{"value":5}}"#
        );
    }

    // -------------------------------------------------------------------------
    // Forwarding

    #[test]
    fn forwarding_to_a_value_member() {
        let mut serializer = serializer();

        let doc = serializer.to_document(&Score { value: 3 }).unwrap();
        assert_eq!(json(&doc), "3");
        assert_eq!(serializer.from_document::<Score>(&doc).unwrap().value, 3);

        let score = Ref::new(Score { value: 4 });
        let doc = serializer.to_document(&vec![score.clone(), score]).unwrap();
        assert_eq!(json(&doc), r#"[{"$content":4,"$id":"0"},{"$ref":"0"}]"#);

        let back = serializer.from_document::<Vec<Ref<Score>>>(&doc).unwrap();
        assert!(Ref::ptr_eq(&back[0], &back[1]));
        assert_eq!(back[0].borrow().unwrap().value, 4);
    }

    #[test]
    fn forwarding_to_a_handle_member() {
        let mut serializer = serializer();
        let handle = Ref::new(LeafHandle {
            leaf: Ref::new(Leaf { value: 5 }),
        });

        let doc = serializer.to_document(&handle).unwrap();
        assert_eq!(json(&doc), r#"{"value":5}"#);
        let back = serializer.from_document::<Ref<LeafHandle>>(&doc).unwrap();
        assert_eq!(back.borrow().unwrap().leaf.borrow().unwrap().value, 5);

        let leaf = Ref::new(Leaf { value: 6 });
        let pinned = Pinned {
            handle: Ref::new(LeafHandle { leaf: leaf.clone() }),
            leaf,
        };
        let doc = serializer.to_document(&pinned).unwrap();
        assert_eq!(
            json(&doc),
            r#"{"handle":{"$content":{"$id":"1","value":6}},"leaf":{"$ref":"1"}}"#
        );

        let back = serializer.from_document::<Pinned>(&doc).unwrap();
        let inner = back.handle.borrow().unwrap().leaf.clone();
        assert!(Ref::ptr_eq(&inner, &back.leaf));
        assert_eq!(inner.borrow().unwrap().value, 6);
    }

    #[test]
    fn versioned_forwarding_keeps_its_version() {
        let mut serializer = serializer();
        let badge = Ref::new(Badge {
            leaf: Ref::new(Leaf { value: 5 }),
        });

        let doc = serializer.to_document(&badge).unwrap();
        assert_eq!(json(&doc), r#"{"$content":{"value":5},"$version":"1"}"#);

        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, TypeId::of::<Ref<Badge>>(), &mut slot);
        assert!(outcome.succeeded());
        assert!(!outcome.has_warnings());
        let back = slot.unwrap().downcast::<Ref<Badge>>().unwrap();
        assert_eq!(back.borrow().unwrap().leaf.borrow().unwrap().value, 5);
    }

    // -------------------------------------------------------------------------
    // Inheritance

    #[test]
    fn runtime_type_is_tagged() {
        let mut serializer = serializer();
        let zoo = Zoo {
            animals: vec![
                Ref::new(Dog {
                    name: "Rex".into(),
                    good: true,
                })
                .upcast(),
                Ref::new(Animal { name: "Tom".into() }),
            ],
        };

        let doc = serializer.to_document(&zoo).unwrap();
        assert_eq!(
            json(&doc),
            r#"{"animals":[{"$type":"Dog","good":true,"name":"Rex"},{"name":"Tom"}]}"#
        );

        let back = serializer.from_document::<Zoo>(&doc).unwrap();
        assert!(back.animals[0].shared().is::<Dog>());
        assert!(back.animals[0].borrow_as::<Dog>().unwrap().good);
        assert_eq!(back.animals[1].borrow().unwrap().name, "Tom");
    }

    #[test]
    fn erased_storage_is_always_tagged() {
        let mut serializer = serializer();
        let bag = Bag {
            item: Some(Shared::new(Animal { name: "Tom".into() })),
        };

        let doc = serializer.to_document(&bag).unwrap();
        assert_eq!(json(&doc), r#"{"item":{"$type":"Animal","name":"Tom"}}"#);

        let back = serializer.from_document::<Bag>(&doc).unwrap();
        assert!(back.item.unwrap().is::<Animal>());
    }

    // -------------------------------------------------------------------------
    // Versioning

    #[test]
    fn current_version_is_written() {
        let mut serializer = serializer();
        let doc = serializer.to_document(&Potion { potency: 4 }).unwrap();
        assert_eq!(json(&doc), r#"{"$version":"2","potency":4}"#);
        assert_eq!(serializer.from_document::<Potion>(&doc).unwrap(), Potion { potency: 4 });
    }

    #[test]
    fn invalid_version_graphs_fail_on_use() {
        #[derive(Describe, Default)]
        #[graph(version = "1")]
        struct Old {
            x: u32,
        }

        #[derive(Describe, Default)]
        #[graph(version = "1", ancestors(Old))]
        struct Clash {
            x: u32,
        }

        #[derive(Describe, Default)]
        #[graph(version = "2", ancestors(Old))]
        struct Unmigrated {
            x: u32,
        }

        impl From<Old> for Clash {
            fn from(old: Old) -> Self {
                Clash { x: old.x }
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register::<Clash>();
        registry.register::<Unmigrated>();
        registry.register_migration::<Old, Clash>();
        let mut serializer = Serializer::new(registry);

        let clash = serializer.to_document(&Clash::default());
        assert!(matches!(
            clash,
            Err(Error::Version(VersionError::DuplicateVersion { .. }))
        ));

        let unmigrated = serializer.to_document(&Unmigrated::default());
        assert!(matches!(
            unmigrated,
            Err(Error::Version(VersionError::MissingMigration { .. }))
        ));

        // Broken graphs elsewhere do not affect a valid one.
        assert!(serializer.to_document(&Old::default()).is_ok());
    }
}
