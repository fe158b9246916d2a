//! Conversion of one or many resources into a prepared list.

use super::{IntoResource, ResourceHandle};
use crate::error::StackError;
use variadics_please::all_tuples;

/// Trait for values that can be converted into an ordered list of handles.
///
/// Implemented for single resources, `Vec`s of resources, `()` and tuples of
/// up to 16 resources, so that
/// [`Contexter::new`](crate::stack::Contexter::new) and
/// [`Contexter::extend`](crate::stack::Contexter::extend) accept any of them.
///
/// Conversion failures are kept in place rather than reported eagerly; they
/// surface when the list is registered, in order.
pub trait IntoResources {
    /// Converts `self` into handles, preserving order.
    fn into_resources(self) -> Vec<Result<ResourceHandle, StackError>>;
}

impl IntoResources for () {
    fn into_resources(self) -> Vec<Result<ResourceHandle, StackError>> {
        Vec::new()
    }
}

/// Single resource implements `IntoResources`.
impl<R: IntoResource> IntoResources for R {
    fn into_resources(self) -> Vec<Result<ResourceHandle, StackError>> {
        vec![self.into_resource()]
    }
}

impl<R: IntoResource> IntoResources for Vec<R> {
    fn into_resources(self) -> Vec<Result<ResourceHandle, StackError>> {
        self.into_iter().map(IntoResource::into_resource).collect()
    }
}

/// Macro to implement `IntoResources` for tuples of resources.
macro_rules! impl_into_resources_for_tuple {
    ($($R:ident),*) => {
        impl<$($R: IntoResource),*> IntoResources for ($($R,)*) {
            fn into_resources(self) -> Vec<Result<ResourceHandle, StackError>> {
                #[expect(
                    non_snake_case,
                    reason = "tuple fields are bound by their type parameter names"
                )]
                let ($($R,)*) = self;
                vec![$($R.into_resource()),*]
            }
        }
    };
}

// Generate implementations for tuples from 2 to 16 elements
all_tuples!(impl_into_resources_for_tuple, 2, 16, R);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Callback, ResourceKind};

    fn callback() -> Callback {
        Callback::new(|| Ok(()))
    }

    #[test]
    fn unit_is_empty() {
        assert!(().into_resources().is_empty());
    }

    #[test]
    fn single_resource() {
        let handles = callback().into_resources();
        assert_eq!(handles.len(), 1);
    }

    #[test]
    fn tuple_preserves_order() {
        let managed = ResourceHandle::managed(crate::resource::ExitCallback::new(|_| Ok(false)));
        let handles = (callback(), managed, callback()).into_resources();

        let kinds: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Closeable,
                ResourceKind::Managed,
                ResourceKind::Closeable
            ]
        );
    }

    #[test]
    fn vec_of_resources() {
        let handles = vec![callback(), callback(), callback()].into_resources();
        assert_eq!(handles.len(), 3);
    }

    #[test]
    fn probe_failures_stay_in_place() {
        let opaque: Box<dyn core::any::Any + Send> = Box::new("not a resource");
        let handles = (callback(), opaque).into_resources();

        assert!(handles[0].is_ok());
        assert!(matches!(
            handles[1],
            Err(StackError::UnsupportedResourceKind(_))
        ));
    }
}
