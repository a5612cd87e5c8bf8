use std::{collections::HashMap, fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, rc::Rc};

/// A handle to some interned value of type `T`, numbered by
/// [`Interner::iter`] order.
pub struct Interned<T: ?Sized> {
    // NonZeroU32 for the niche in `Option<Interned<T>>`.
    handle: NonZeroU32,
    _ty: PhantomData<T>,
}

impl<T: ?Sized> Interned<T> {
    const fn new(handle: NonZeroU32) -> Self {
        Interned {
            handle,
            _ty: PhantomData,
        }
    }

    /// Zero-based position of the value, in first-interned order.
    pub fn index(self) -> usize {
        self.handle.get() as usize - 1
    }
}

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Interned<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: ?Sized> Eq for Interned<T> {}

impl<T: ?Sized> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interned({})", self.index())
    }
}

/// Content-addressed storage: interning equal values twice yields the same
/// handle, and values are kept in the order they were first seen.
pub struct Interner<T: ?Sized> {
    map: HashMap<Rc<T>, NonZeroU32>,
    vec: Vec<Rc<T>>,
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Interner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.vec.iter().enumerate()).finish()
    }
}

impl<T: ?Sized> Default for Interner<T> {
    fn default() -> Self {
        Interner::with_capacity(0)
    }
}

impl<T: ?Sized> Interner<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Interns the provided value, returning a handle which can be used to
    /// retrieve it later.
    pub fn intern(&mut self, value: &T) -> Interned<T>
    where
        T: Eq + Hash + ToOwned,
        T::Owned: Into<Rc<T>>,
    {
        if let Some(handle) = self.map.get(value) {
            return Interned::new(*handle);
        }
        let key: Rc<T> = value.to_owned().into();
        let handle = u32::try_from(self.vec.len() + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .expect("interner out of capacity");
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, handle);
        Interned::new(handle)
    }

    /// Iterates over every interned value along with its handle, in
    /// first-interned order.
    pub fn iter(&self) -> impl Iterator<Item = (Interned<T>, &T)> + '_ {
        self.vec.iter().enumerate().filter_map(|(i, value)| {
            let handle = NonZeroU32::new(u32::try_from(i + 1).ok()?)?;
            Some((Interned::new(handle), &**value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner() {
        let mut i = Interner::<str>::with_capacity(3);

        let hello1 = i.intern("hello");
        let world1 = i.intern("world");
        let hello2 = i.intern("hello");

        assert_eq!(hello1, hello2);
        assert_ne!(hello1, world1);
        assert_eq!(world1.index(), 1);

        let values: Vec<_> = i.iter().map(|(_, v)| v).collect();
        assert_eq!(values, ["hello", "world"]);
    }

    #[test]
    fn first_use_order() {
        let mut i = Interner::<str>::default();
        i.intern("%lld\n");
        i.intern("%s\n");
        i.intern("%lld\n");

        let values: Vec<_> = i.iter().map(|(h, v)| (h.index(), v)).collect();
        assert_eq!(values, [(0, "%lld\n"), (1, "%s\n")]);
    }
}
