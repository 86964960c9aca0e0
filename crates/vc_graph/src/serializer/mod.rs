//! The serializer and its pipelines.
//!
//! Serialization of a value runs these stages, each wrapping the next:
//!
//! 1. **Cycles**: an object seen before becomes `{"$ref": id}`, and
//!    referenced definitions get `"$id"`.
//! 2. **Inheritance**: `"$type"` is added when the runtime type differs from
//!    the storage type.
//! 3. **Versioning**: `"$version"` is added for versioned models.
//! 4. **Converter**: the payload itself.
//!
//! Deserialization reads them back in the same order: references, version
//! migrations, the type tag, instance creation, object registration and
//! finally the converter.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;

#[cfg(all(debug_assertions, feature = "debug"))]
mod stack;

// -----------------------------------------------------------------------------
// Serializer

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::mem;

use log::warn;
use vc_document::{CONTENT_KEY, Document};

use crate::converter::{Converter, ConverterRegistry, wrong_instance};
use crate::cycle::{LazyDefinitionWriter, ReferenceTracker};
use crate::hash::TypeIdMap;
use crate::processor::Processor;
use crate::registry::{Override, TypeMeta, TypeRegistry};
use crate::version::{VersionCache, VersionedType};
use crate::{Config, Error};

/// Converts object graphs to [`Document`]s and back.
///
/// A serializer owns its configuration, its converters and the state of the
/// call in progress. It is single-threaded, and converters re-enter it for
/// nested values through [`serialize`](Self::serialize) and
/// [`deserialize`](Self::deserialize).
///
/// # Examples
///
/// ```
/// use vc_graph::registry::{Ref, TypeRegistry};
/// use vc_graph::{Describe, Serializer};
///
/// #[derive(Describe, Default)]
/// struct Node {
///     name: String,
///     next: Option<Ref<Node>>,
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Ref<Node>>();
/// let mut serializer = Serializer::new(registry);
///
/// let node = Ref::new(Node { name: "loop".into(), next: None });
/// node.borrow_mut().unwrap().next = Some(node.clone());
///
/// let doc = serializer.to_document(&node).unwrap();
/// assert_eq!(
///     serde_json::to_string(&doc).unwrap(),
///     r#"{"$id":"0","name":"loop","next":{"$ref":"0"}}"#,
/// );
///
/// let back = serializer.from_document::<Ref<Node>>(&doc).unwrap();
/// let next = back.borrow().unwrap().next.clone().unwrap();
/// assert!(Ref::ptr_eq(&back, &next));
/// # node.borrow_mut().unwrap().next = None;
/// # back.borrow_mut().unwrap().next = None;
/// ```
pub struct Serializer {
    registry: Rc<TypeRegistry>,
    converters: ConverterRegistry,
    processors: Vec<Rc<dyn Processor>>,
    processor_cache: TypeIdMap<Rc<[Rc<dyn Processor>]>>,
    versions: VersionCache,
    references: ReferenceTracker,
    lazy: LazyDefinitionWriter,
    warnings: Vec<String>,
    config: Config,
    #[cfg(all(debug_assertions, feature = "debug"))]
    stack: stack::TypeStack,
}

impl Serializer {
    /// A serializer with the built-in converters and the default [`Config`].
    #[inline]
    pub fn new(registry: TypeRegistry) -> Self {
        SerializerBuilder::new(registry).build()
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adds a converter to the general pool, see [`ConverterRegistry::add`].
    pub fn add_converter(&mut self, converter: impl Converter + 'static) {
        self.converters.add(converter);
        self.processor_cache.clear();
        self.versions.clear();
    }

    /// Adds a converter used for exactly `T`.
    pub fn add_direct_converter<T: Any>(&mut self, converter: impl Converter + 'static) {
        self.converters.add_direct::<T>(converter);
        self.processor_cache.clear();
        self.versions.clear();
    }

    pub fn add_processor(&mut self, processor: impl Processor + 'static) {
        self.processors.push(Rc::new(processor));
        self.processor_cache.clear();
    }

    /// Records a warning for the call in progress.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    /// Handles the failure of one part of a container.
    ///
    /// A recoverable error becomes a warning mentioning `context` and `Ok` is
    /// returned, so the caller can skip the part. Any other error, or any
    /// error in [strict](Config::strict) mode, is returned as is.
    pub fn skip_or_fail(&mut self, error: Error, context: &str) -> Result<(), Error> {
        if self.config.strict || !error.is_recoverable() {
            return Err(error);
        }
        self.warn(format!("skipped {context}: {error}"));
        Ok(())
    }

    /// Turns a recoverable problem into a warning, unless in strict mode.
    fn soft_fail(&mut self, error: Error) -> Result<(), Error> {
        if self.config.strict {
            return Err(error);
        }
        self.warn(format!("{error}"));
        Ok(())
    }

    /// Drains the warnings recorded since the last top-level call started.
    #[inline]
    pub fn take_warnings(&mut self) -> Vec<String> {
        mem::take(&mut self.warnings)
    }

    /// The validated version graph of `model`, or `None` if it is not versioned.
    pub fn versioned_type(&mut self, model: TypeId) -> Result<Option<Rc<VersionedType>>, Error> {
        Ok(self.versions.get(&self.registry, model)?)
    }

    fn processors_for(&mut self, meta: &TypeMeta) -> Rc<[Rc<dyn Processor>]> {
        if let Some(processors) = self.processor_cache.get(&meta.type_id()) {
            return processors.clone();
        }
        let processors: Rc<[Rc<dyn Processor>]> = self
            .processors
            .iter()
            .filter(|processor| processor.can_process(meta))
            .cloned()
            .collect();
        self.processor_cache.insert(meta.type_id(), processors.clone());
        processors
    }

    // Called when a public entry point starts. Returns where the warnings of
    // this call start in the sink.
    fn begin_call(&mut self) -> usize {
        if self.references.depth() == 0 {
            self.warnings.clear();
        }
        self.warnings.len()
    }

    // The warnings of a call that started at `mark`. Nested calls leave them
    // in the sink so the enclosing call reports them too.
    fn end_call(&mut self, mark: usize) -> Vec<String> {
        if self.references.depth() == 0 {
            mem::take(&mut self.warnings)
        } else {
            self.warnings[mark..].to_vec()
        }
    }

    fn convert_serialize(
        &mut self,
        converter: &dyn Converter,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.push(meta.name());

        let result = converter.serialize(self, value, meta);

        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.pop(result.as_ref().err());

        result
    }

    fn convert_deserialize(
        &mut self,
        converter: &dyn Converter,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error> {
        if data.is_wrapped() && data.has_user_members() {
            self.warn(format!(
                "ignoring members next to `{CONTENT_KEY}` of `{}`",
                meta.name()
            ));
        }

        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.push(meta.name());

        let result = converter.deserialize(self, data.unwrap_content(), instance, meta);

        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.pop(result.as_ref().err());

        result
    }

    fn create_instance(
        &mut self,
        converter: &dyn Converter,
        data: &Document,
        meta: &TypeMeta,
    ) -> Result<Box<dyn Any>, Error> {
        let instance = converter.create_instance(data, meta)?;
        if (*instance).type_id() != meta.type_id() {
            return Err(wrong_instance(meta));
        }
        Ok(instance)
    }
}

#[inline]
fn unregistered(type_id: TypeId) -> Error {
    Error::Unregistered(format!("{type_id:?}"))
}

// -----------------------------------------------------------------------------
// SerializerBuilder

/// Explicit setup of a [`Serializer`].
///
/// # Examples
///
/// ```
/// use vc_graph::registry::TypeRegistry;
/// use vc_graph::{Config, NameStyle, SerializerBuilder};
///
/// let serializer = SerializerBuilder::new(TypeRegistry::new())
///     .config(Config {
///         member_names: NameStyle::CamelCase,
///         ..Config::default()
///     })
///     .build();
///
/// assert_eq!(serializer.config().member_names, NameStyle::CamelCase);
/// ```
pub struct SerializerBuilder {
    registry: TypeRegistry,
    converters: ConverterRegistry,
    processors: Vec<Rc<dyn Processor>>,
    config: Config,
}

impl SerializerBuilder {
    /// Starts from the built-in converters and the default [`Config`].
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            converters: ConverterRegistry::new(),
            processors: Vec::new(),
            config: Config::default(),
        }
    }

    #[inline]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Adds a converter to the general pool.
    #[inline]
    pub fn converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.add(converter);
        self
    }

    /// Adds a converter used for exactly `T`.
    #[inline]
    pub fn direct_converter<T: Any>(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.add_direct::<T>(converter);
        self
    }

    /// Overrides the converter of `T`, including any override declared on `T`.
    #[inline]
    pub fn override_type<T: Any>(mut self, choice: Override) -> Self {
        self.converters.set_override::<T>(choice);
        self
    }

    #[inline]
    pub fn processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Rc::new(processor));
        self
    }

    pub fn build(self) -> Serializer {
        Serializer {
            registry: Rc::new(self.registry),
            converters: self.converters,
            processors: self.processors,
            processor_cache: TypeIdMap::default(),
            versions: VersionCache::default(),
            references: ReferenceTracker::default(),
            lazy: LazyDefinitionWriter::default(),
            warnings: Vec::new(),
            config: self.config,
            #[cfg(all(debug_assertions, feature = "debug"))]
            stack: stack::TypeStack::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::any::{Any, TypeId};
    use core::cell::Cell;

    use vc_document::Document;

    use crate::converter::Converter;
    use crate::registry::{Ref, Shared, TypeMeta, TypeRegistry};
    use crate::{Config, Describe, Error, Processor, Serializer, SerializerBuilder};

    pub(super) fn json(doc: &Document) -> String {
        serde_json::to_string(doc).unwrap()
    }

    pub(super) fn parse(text: &str) -> Document {
        serde_json::from_str(text).unwrap()
    }

    pub(super) fn strict() -> Config {
        Config {
            strict: true,
            ..Config::default()
        }
    }

    // -------------------------------------------------------------------------
    // Models

    #[derive(Describe, Default, Debug, Clone, Copy, PartialEq)]
    pub(super) enum Mood {
        #[default]
        Calm,
        Furious,
    }

    #[derive(Describe, Default, Debug, PartialEq)]
    #[graph(name = "Stats")]
    pub(super) struct Stats {
        pub(super) max_hit_points: u32,
        pub(super) ratio: f64,
        pub(super) title: String,
        pub(super) tags: Vec<String>,
        pub(super) mood: Mood,
        pub(super) note: Option<String>,
    }

    #[derive(Describe, Default)]
    #[graph(name = "Leaf")]
    pub(super) struct Leaf {
        pub(super) value: u32,
    }

    #[derive(Describe, Default)]
    pub(super) struct Pair {
        pub(super) left: Ref<Leaf>,
        pub(super) right: Ref<Leaf>,
    }

    #[derive(Describe, Default)]
    pub(super) struct Empty;

    #[derive(Describe, Default)]
    pub(super) struct Holder {
        pub(super) value: Ref<Empty>,
    }

    #[derive(Describe, Default)]
    #[graph(name = "Animal")]
    pub(super) struct Animal {
        pub(super) name: String,
    }

    #[derive(Describe, Default)]
    #[graph(name = "Dog", extends(Animal))]
    pub(super) struct Dog {
        pub(super) name: String,
        pub(super) good: bool,
    }

    #[derive(Describe, Default)]
    pub(super) struct Zoo {
        pub(super) animals: Vec<Ref<Animal>>,
    }

    #[derive(Describe, Default)]
    pub(super) struct Bag {
        pub(super) item: Option<Shared>,
    }

    #[derive(Describe, Default)]
    pub(super) struct Mixed {
        pub(super) animal: Ref<Animal>,
        pub(super) leaf: Ref<Leaf>,
    }

    #[derive(Describe, Default, Debug, PartialEq)]
    #[graph(name = "PotionV1", version = "1")]
    pub(super) struct PotionV1 {
        pub(super) strength: u32,
    }

    #[derive(Describe, Default, Debug, PartialEq)]
    #[graph(name = "Potion", version = "2", ancestors(PotionV1))]
    pub(super) struct Potion {
        pub(super) potency: u32,
    }

    impl From<PotionV1> for Potion {
        fn from(old: PotionV1) -> Self {
            Potion {
                potency: old.strength * 2,
            }
        }
    }

    #[derive(Describe, Default)]
    #[graph(forward = "value")]
    pub(super) struct Score {
        pub(super) value: u32,
    }

    #[derive(Describe, Default)]
    #[graph(forward = "leaf")]
    pub(super) struct LeafHandle {
        pub(super) leaf: Ref<Leaf>,
    }

    #[derive(Describe, Default)]
    pub(super) struct Pinned {
        pub(super) handle: Ref<LeafHandle>,
        pub(super) leaf: Ref<Leaf>,
    }

    #[derive(Describe, Default)]
    #[graph(name = "Badge", version = "1", forward = "leaf")]
    pub(super) struct Badge {
        pub(super) leaf: Ref<Leaf>,
    }

    #[derive(Describe, Default)]
    pub(super) struct Tally {
        pub(super) counts: BTreeMap<String, u64>,
        pub(super) leaf: Ref<Leaf>,
    }

    pub(super) fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Stats>();
        registry.register::<Pair>();
        registry.register::<Ref<Leaf>>();
        registry.register::<Vec<Holder>>();
        registry.register::<Zoo>();
        registry.register::<Dog>();
        registry.register::<Ref<Animal>>();
        registry.register::<Bag>();
        registry.register::<Mixed>();
        registry.register::<Ref<Potion>>();
        registry.register_migration::<PotionV1, Potion>();
        registry.register::<Vec<Ref<Score>>>();
        registry.register::<Ref<LeafHandle>>();
        registry.register::<Pinned>();
        registry.register::<Ref<Badge>>();
        registry.register::<Tally>();
        registry
    }

    pub(super) fn serializer() -> Serializer {
        Serializer::new(registry())
    }

    // -------------------------------------------------------------------------
    // Warnings

    #[test]
    fn warnings_belong_to_one_call() {
        let mut serializer = serializer();

        let _ = serializer.from_document::<Leaf>(&parse(r#"{"value":"many"}"#));
        assert_eq!(serializer.take_warnings().len(), 1);

        let _ = serializer.from_document::<Leaf>(&parse(r#"{"value":"many"}"#));
        let _ = serializer.from_document::<Leaf>(&parse(r#"{"value":2}"#));
        assert!(serializer.take_warnings().is_empty());
    }

    #[derive(Default)]
    struct EnvelopeConverter;

    impl Converter for EnvelopeConverter {
        fn can_process(&self, _: &TypeMeta) -> bool {
            false
        }

        fn serialize(
            &self,
            _: &mut Serializer,
            _: &dyn Any,
            _: &TypeMeta,
        ) -> Result<Document, Error> {
            Ok(Document::Null)
        }

        fn deserialize(
            &self,
            serializer: &mut Serializer,
            data: &Document,
            instance: &mut dyn Any,
            _: &TypeMeta,
        ) -> Result<(), Error> {
            let animal = data
                .get("animal")
                .ok_or_else(|| Error::custom("no animal"))?;
            let mut slot = None;
            let outcome =
                serializer.try_deserialize(animal, TypeId::of::<Ref<Animal>>(), &mut slot);

            let envelope = instance
                .downcast_mut::<Envelope>()
                .ok_or_else(|| Error::custom("not an envelope"))?;
            envelope.inner_warnings = outcome.warnings().len();
            outcome.into_result().map(drop)
        }
    }

    #[derive(Describe, Default)]
    #[graph(converter = EnvelopeConverter)]
    struct Envelope {
        inner_warnings: usize,
    }

    #[test]
    fn nested_calls_report_to_the_outer_call() {
        let mut registry = registry();
        registry.register::<Envelope>();
        let mut serializer = Serializer::new(registry);
        let doc = parse(r#"{"animal":{"$type":"Ghost","name":"Boo"}}"#);

        let mut slot = None;
        let outcome = serializer.try_deserialize(&doc, TypeId::of::<Envelope>(), &mut slot);
        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings().len(), 1);
        assert_eq!(slot.unwrap().downcast::<Envelope>().unwrap().inner_warnings, 1);

        let mut slot = None;
        let clean = parse(r#"{"animal":{"name":"Boo"}}"#);
        let outcome = serializer.try_deserialize(&clean, TypeId::of::<Envelope>(), &mut slot);
        assert!(!outcome.has_warnings());
    }

    // -------------------------------------------------------------------------
    // Processors

    struct Stamp {
        after_deserialize: Rc<Cell<usize>>,
    }

    impl Processor for Stamp {
        fn can_process(&self, meta: &TypeMeta) -> bool {
            meta.ty().is::<Leaf>()
        }

        fn after_serialize(&self, _: &TypeMeta, _: &dyn Any, data: &mut Document) {
            if let Some(map) = data.as_object_mut() {
                map.insert("stamp".into(), Document::Bool(true));
            }
        }

        fn before_deserialize(&self, _: &TypeMeta, data: &mut Document) {
            if let Some(map) = data.as_object_mut() {
                map.insert("value".into(), Document::from(42_i64));
            }
        }

        fn after_deserialize(&self, _: &TypeMeta, _: &mut dyn Any) {
            self.after_deserialize.set(self.after_deserialize.get() + 1);
        }
    }

    #[test]
    fn processors_wrap_matching_types() {
        let count = Rc::new(Cell::new(0));
        let mut serializer = SerializerBuilder::new(registry())
            .processor(Stamp {
                after_deserialize: count.clone(),
            })
            .build();

        let doc = serializer.to_document(&Leaf { value: 1 }).unwrap();
        assert_eq!(json(&doc), r#"{"stamp":true,"value":1}"#);

        let stats = serializer.to_document(&Stats::default()).unwrap();
        assert_eq!(stats.get("stamp"), None);

        let leaf = serializer.from_document::<Leaf>(&doc).unwrap();
        assert_eq!(leaf.value, 42);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn adding_converters_resets_caches() {
        let mut serializer = serializer();
        serializer.add_processor(Stamp {
            after_deserialize: Rc::new(Cell::new(0)),
        });

        serializer.to_document(&Leaf { value: 1 }).unwrap();
        assert!(!serializer.processor_cache.is_empty());
        serializer.add_converter(EnvelopeConverter);
        assert!(serializer.processor_cache.is_empty());

        serializer.to_document(&Leaf { value: 1 }).unwrap();
        assert!(!serializer.processor_cache.is_empty());
        serializer.add_direct_converter::<Envelope>(EnvelopeConverter);
        assert!(serializer.processor_cache.is_empty());
    }
}
