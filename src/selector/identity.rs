use std::rc::Rc;
use std::sync::Arc;

/// Cheap, shallow equality used by default to decide whether selector inputs changed.
///
/// Shared pointers compare by address, plain scalars by value, and tuples
/// position-wise.
pub trait Identity {
    fn is_identical(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
    fn is_identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identity for Rc<T> {
    fn is_identical(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identity for &T {
    fn is_identical(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}

impl<T: Identity> Identity for Option<T> {
    fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.is_identical(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! scalar_identity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identity for $ty {
                fn is_identical(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

scalar_identity!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize,
);

macro_rules! tuple_identity {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Identity),+> Identity for ($($name,)+) {
            fn is_identical(&self, other: &Self) -> bool {
                $(self.$idx.is_identical(&other.$idx))&&+
            }
        }
    };
}

tuple_identity!(A 0);
tuple_identity!(A 0, B 1);
tuple_identity!(A 0, B 1, C 2);
tuple_identity!(A 0, B 1, C 2, D 3);
tuple_identity!(A 0, B 1, C 2, D 3, E 4);
tuple_identity!(A 0, B 1, C 2, D 3, E 4, F 5);
