use crate::{Result, Statement, encode::Encode, slot::AutoBinder, slot::AutoGetter};

/// A type that can be built from the current row of a statement.
///
/// Tuples read their elements from consecutive columns starting at 0. A single column is read
/// as a one-element tuple, `(T,)`.
pub trait FromRow<'r>: Sized {
    fn from_row(stmt: &'r Statement<'_>) -> Result<Self>;
}

/// A group of values that can be bound to consecutive parameters.
///
/// Values are copied into the statement, so the group only has to live for the call.
pub trait BindAll {
    fn bind_all(&self, binder: &mut AutoBinder<'_, '_>) -> Result<()>;
}

impl BindAll for () {
    fn bind_all(&self, _binder: &mut AutoBinder<'_, '_>) -> Result<()> {
        Ok(())
    }
}

impl<T> BindAll for [T]
where
    T: Encode,
{
    fn bind_all(&self, binder: &mut AutoBinder<'_, '_>) -> Result<()> {
        for value in self {
            binder.bind_copy(value)?;
        }
        Ok(())
    }
}

impl<T> BindAll for Vec<T>
where
    T: Encode,
{
    fn bind_all(&self, binder: &mut AutoBinder<'_, '_>) -> Result<()> {
        self.as_slice().bind_all(binder)
    }
}

macro_rules! impl_tuples {
    ($($T:ident),+) => {
        impl<'r, $($T,)+> FromRow<'r> for ($($T,)+)
        where
            $($T: crate::decode::Decode<'r>,)+
        {
            fn from_row(stmt: &'r Statement<'_>) -> Result<Self> {
                let mut getter = AutoGetter::new(stmt);
                Ok(($(getter.get::<$T>()?,)+))
            }
        }

        impl<$($T,)+> BindAll for ($($T,)+)
        where
            $($T: Encode,)+
        {
            #[allow(non_snake_case)]
            fn bind_all(&self, binder: &mut AutoBinder<'_, '_>) -> Result<()> {
                let ($($T,)+) = self;
                $(binder.bind_copy($T)?;)+
                Ok(())
            }
        }
    };
}

impl_tuples!(T1);
impl_tuples!(T1, T2);
impl_tuples!(T1, T2, T3);
impl_tuples!(T1, T2, T3, T4);
impl_tuples!(T1, T2, T3, T4, T5);
impl_tuples!(T1, T2, T3, T4, T5, T6);
impl_tuples!(T1, T2, T3, T4, T5, T6, T7);
impl_tuples!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_tuples!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_tuples!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_tuples!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_tuples!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
