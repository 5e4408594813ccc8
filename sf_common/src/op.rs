//! Operator forwarding for single-field newtypes.
//!
//! `binary`, `inplace` and `unary` forward to the inner value's operator. `scalar` multiplies or divides the inner
//! value by a plain integer, e.g. a unit price by a quantity.

#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$impl_fn(rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                self.0.$impl_fn(rhs.0)
            }
        }
    };

    (unary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self) -> Self::Output {
                Self(self.0.$impl_fn())
            }
        }
    };

    (scalar $for_struct:ident, $scalar:ty, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait<$scalar> for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: $scalar) -> Self::Output {
                Self(self.0.$impl_fn(rhs))
            }
        }
    };
}
