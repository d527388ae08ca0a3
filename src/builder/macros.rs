//! Macros for declaring event types.

/// Implement [`Event`](crate::core::Event) for one or more types.
///
/// A single type may declare a supertype, which feeds the
/// [`compatible`](crate::core::compatible) relation. Handler lookup is
/// unaffected: tables always match the exact type.
///
/// # Example
///
/// ```
/// use hierarch::impl_event;
/// use hierarch::core::{compatible, Event};
///
/// #[derive(Debug)]
/// struct Input;
/// #[derive(Debug)]
/// struct KeyPress(char);
/// #[derive(Debug)]
/// struct Tick;
/// #[derive(Debug)]
/// struct Reset;
///
/// impl_event!(Input);
/// impl_event!(KeyPress: Input);
/// impl_event!(Tick, Reset);
///
/// assert!(compatible(Some(&KeyPress('q')), Some(&Input)));
/// assert!(!compatible(Some(&Tick), Some(&Reset)));
/// ```
#[macro_export]
macro_rules! impl_event {
    ($name:ty : $parent:ty) => {
        impl $crate::core::Event for $name {
            fn event_type(&self) -> $crate::core::EventType {
                $crate::core::EventType::of::<Self>()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn supertype() -> ::std::option::Option<$crate::core::EventType> {
                ::std::option::Option::Some($crate::core::EventType::of::<$parent>())
            }
        }
    };

    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::core::Event for $name {
                fn event_type(&self) -> $crate::core::EventType {
                    $crate::core::EventType::of::<Self>()
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }
        )+
    };
}
