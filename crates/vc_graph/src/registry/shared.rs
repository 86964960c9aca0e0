use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::Any;
use core::cell::{self, Cell, RefCell};
use core::fmt;
use core::marker::PhantomData;
use core::mem;

use super::{MigrateFn, Type};

// -----------------------------------------------------------------------------
// Shared

struct Inner {
    // Kept outside of the cell so it can be read while the value is borrowed.
    ty: Cell<Type>,
    value: RefCell<Box<dyn Any>>,
}

/// A type-erased, shared, mutable object.
///
/// Values stored behind a `Shared` are *objects*: the serializer tracks them
/// by identity, so an object that is reachable through several references,
/// including through itself, is written once and restored as a single
/// instance. Everything else is a *value* and is copied on every occurrence.
///
/// Identity is the address of the allocation, and clones share it.
///
/// # Examples
///
/// ```
/// use vc_graph::registry::Shared;
///
/// let a = Shared::new(5_u32);
/// let b = a.clone();
///
/// *b.borrow_mut::<u32>().unwrap() += 1;
///
/// assert!(Shared::ptr_eq(&a, &b));
/// assert_eq!(*a.borrow::<u32>().unwrap(), 6);
/// assert!(a.borrow::<i32>().is_none());
/// ```
#[derive(Clone)]
pub struct Shared(Rc<Inner>);

impl Shared {
    pub fn new<T: Any>(value: T) -> Self {
        Self::from_boxed(Type::of::<T>(), Box::new(value))
    }

    /// `ty` must describe the content of `value`.
    pub(crate) fn from_boxed(ty: Type, value: Box<dyn Any>) -> Self {
        debug_assert_eq!(ty.id(), (*value).type_id());
        Self(Rc::new(Inner {
            ty: Cell::new(ty),
            value: RefCell::new(value),
        }))
    }

    /// The runtime type of the content.
    #[inline]
    pub fn content_type(&self) -> Type {
        self.0.ty.get()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.content_type().is::<T>()
    }

    /// Borrows the content as `T`.
    ///
    /// Returns `None` if the content is not a `T`.
    ///
    /// # Panics
    ///
    /// Panics if the content is currently mutably borrowed.
    pub fn borrow<T: Any>(&self) -> Option<cell::Ref<'_, T>> {
        cell::Ref::filter_map(self.0.value.borrow(), |v| (**v).downcast_ref::<T>()).ok()
    }

    /// Mutably borrows the content as `T`.
    ///
    /// Returns `None` if the content is not a `T`.
    ///
    /// # Panics
    ///
    /// Panics if the content is currently borrowed.
    pub fn borrow_mut<T: Any>(&self) -> Option<cell::RefMut<'_, T>> {
        cell::RefMut::filter_map(self.0.value.borrow_mut(), |v| (**v).downcast_mut::<T>()).ok()
    }

    #[inline]
    pub(crate) fn borrow_any(&self) -> cell::Ref<'_, Box<dyn Any>> {
        self.0.value.borrow()
    }

    #[inline]
    pub(crate) fn borrow_any_mut(&self) -> cell::RefMut<'_, Box<dyn Any>> {
        self.0.value.borrow_mut()
    }

    /// Replaces the content by running a migration on it.
    ///
    /// On failure the content is left untouched and `false` is returned.
    pub(crate) fn migrate(&self, to: Type, migration: MigrateFn) -> bool {
        let mut guard = self.0.value.borrow_mut();
        let old = mem::replace(&mut *guard, Box::new(()));
        match migration(old) {
            Ok(new) => {
                debug_assert_eq!(to.id(), (*new).type_id());
                *guard = new;
                self.0.ty.set(to);
                true
            }
            Err(old) => {
                *guard = old;
                false
            }
        }
    }

    /// Returns `true` if both handles point to the same object.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }

    /// The identity of the object.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).addr()
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared<{}>({:#x})", self.content_type(), self.addr())
    }
}

// -----------------------------------------------------------------------------
// Ref

/// A typed handle to a [`Shared`] object.
///
/// `T` is the *storage* type: the content may be `T` itself or any type that
/// was registered as [extending](super::TypeMeta::with_extends) it.
///
/// # Examples
///
/// ```
/// use vc_graph::registry::Ref;
///
/// let a = Ref::new(String::from("hello"));
/// let b = a.clone();
///
/// b.borrow_mut().unwrap().push('!');
///
/// assert!(Ref::ptr_eq(&a, &b));
/// assert_eq!(*a.borrow().unwrap(), "hello!");
/// ```
pub struct Ref<T: Any> {
    shared: Shared,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> Ref<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self::from_shared(Shared::new(value))
    }

    /// Wraps an object, declaring `T` as its storage type.
    #[inline]
    pub const fn from_shared(shared: Shared) -> Self {
        Self {
            shared,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn shared(&self) -> &Shared {
        &self.shared
    }

    #[inline]
    pub fn into_shared(self) -> Shared {
        self.shared
    }

    /// Borrows the content if it is exactly a `T`.
    #[inline]
    pub fn borrow(&self) -> Option<cell::Ref<'_, T>> {
        self.shared.borrow::<T>()
    }

    /// Mutably borrows the content if it is exactly a `T`.
    #[inline]
    pub fn borrow_mut(&self) -> Option<cell::RefMut<'_, T>> {
        self.shared.borrow_mut::<T>()
    }

    /// Borrows the content as a concrete type other than the storage type.
    #[inline]
    pub fn borrow_as<U: Any>(&self) -> Option<cell::Ref<'_, U>> {
        self.shared.borrow::<U>()
    }

    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Shared::ptr_eq(&this.shared, &other.shared)
    }

    /// Changes the declared storage type, keeping the identity.
    #[inline]
    pub fn upcast<U: Any>(self) -> Ref<U> {
        Ref::from_shared(self.shared)
    }
}

impl<T: Any> Clone for Ref<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self::from_shared(self.shared.clone())
    }
}

impl<T: Any + Default> Default for Ref<T> {
    #[inline]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Any> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.shared, f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use core::any::Any;

    use super::{Ref, Shared, Type};

    #[test]
    fn content_type_is_readable_while_borrowed() {
        let shared = Shared::new(String::from("x"));
        let _guard = shared.borrow_mut::<String>().unwrap();
        assert!(shared.is::<String>());
        assert_eq!(shared.content_type(), Type::of::<String>());
    }

    #[test]
    fn migrate_swaps_content_in_place() {
        let a = Ref::new(3_u8);
        let alias = a.shared().clone();

        let widen: fn(Box<dyn Any>) -> Result<Box<dyn Any>, Box<dyn Any>> =
            |old| Ok(Box::new(u32::from(*old.downcast::<u8>()?)));
        assert!(alias.migrate(Type::of::<u32>(), widen));

        assert!(a.borrow().is_none());
        assert_eq!(*a.borrow_as::<u32>().unwrap(), 3);
        assert!(alias.is::<u32>());
    }

    #[test]
    fn failed_migration_keeps_content() {
        let shared = Shared::new(1_i8);
        let refuse: fn(Box<dyn Any>) -> Result<Box<dyn Any>, Box<dyn Any>> = Err;
        assert!(!shared.migrate(Type::of::<u32>(), refuse));
        assert_eq!(*shared.borrow::<i8>().unwrap(), 1);
    }

    #[test]
    fn upcast_keeps_identity() {
        let a = Ref::new(1_i32);
        let b = a.clone().upcast::<Shared>();
        assert!(Shared::ptr_eq(a.shared(), b.shared()));
    }
}
