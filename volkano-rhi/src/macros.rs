/// Declares a set of optional Vulkan extensions, one `bool` per extension.
///
/// The set converts to and from a fixed-size array indexed like the
/// declaration, which the set operations are built on.
#[macro_export]
macro_rules! extension_set {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ident:ident {
            $(
                $field:ident => $name:expr,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $ident {
            $(
                pub $field: bool,
            )*
        }

        impl $ident {
            const LEN: usize = [$(stringify!($field)),*].len();

            pub const fn empty() -> Self {
                Self {
                    $(
                        $field: false,
                    )*
                }
            }

            fn names() -> [&'static std::ffi::CStr; Self::LEN] {
                [$($name),*]
            }

            fn to_array(self) -> [bool; Self::LEN] {
                [$(self.$field),*]
            }

            fn from_array(enabled: [bool; Self::LEN]) -> Self {
                let [$($field),*] = enabled;
                Self { $($field),* }
            }

            /// Collects the known extensions out of `names`. Unknown names are
            /// ignored.
            pub fn from_iter<'a>(names: impl Iterator<Item = &'a std::ffi::CStr>) -> Self {
                let known = Self::names();
                let mut enabled = [false; Self::LEN];
                for name in names {
                    if let Some(index) = known.iter().position(|known| *known == name) {
                        enabled[index] = true;
                    }
                }

                Self::from_array(enabled)
            }

            pub fn iter_c_strs(&self) -> impl Iterator<Item = &'static std::ffi::CStr> {
                Self::names()
                    .into_iter()
                    .zip(self.to_array())
                    .filter_map(|(name, enabled)| enabled.then_some(name))
            }

            // Names come from ash statics, so the pointers never dangle.
            pub fn iter_c_ptrs(&self) -> impl Iterator<Item = *const std::ffi::c_char> {
                self.iter_c_strs().map(std::ffi::CStr::as_ptr)
            }

            pub fn is_empty(&self) -> bool {
                !self.to_array().contains(&true)
            }

            /// The extensions enabled in `self` but not in `other`.
            pub fn difference(&self, other: &Self) -> Self {
                let lhs = self.to_array();
                let rhs = other.to_array();
                Self::from_array(std::array::from_fn(|index| lhs[index] && !rhs[index]))
            }
        }

        impl std::fmt::Display for $ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let names = self
                    .iter_c_strs()
                    .map(std::ffi::CStr::to_string_lossy)
                    .collect::<Vec<_>>();
                write!(f, "[{}]", names.join(", "))
            }
        }
    };
}

/// Declares a plain enum mirroring a subset of a Vulkan enum.
#[macro_export]
macro_rules! vk_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $ident:ident: $vk_type:ty {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $vk_value:ident,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $ident {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $ident {
            const TABLE: &'static [(Self, $vk_type)] = &[
                $(
                    (Self::$variant, <$vk_type>::$vk_value),
                )*
            ];

            /// Returns `None` for values this enum does not mirror.
            pub fn from_vk(value: $vk_type) -> Option<Self> {
                Self::TABLE
                    .iter()
                    .find(|(_, vk_value)| *vk_value == value)
                    .map(|(variant, _)| *variant)
            }

            pub const fn to_vk(self) -> $vk_type {
                match self {
                    $(
                        Self::$variant => <$vk_type>::$vk_value,
                    )*
                }
            }
        }

        impl std::fmt::Display for $ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

/// Declares a newtype over Vulkan flags exposing only the listed bits.
#[macro_export]
macro_rules! vk_flags {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ident:ident: $vk_type:ty {
            $(
                $(#[$flag_meta:meta])*
                $flag:ident => $vk_flag:ident,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        $vis struct $ident($vk_type);

        impl $ident {
            $(
                $(#[$flag_meta])*
                pub const $flag: Self = Self(<$vk_type>::$vk_flag);
            )*

            pub const fn empty() -> Self {
                Self(<$vk_type>::empty())
            }

            pub const fn is_empty(self) -> bool {
                self.0.is_empty()
            }

            /// Whether every bit of `other` is set.
            pub const fn contains(self, other: Self) -> bool {
                self.0.contains(other.0)
            }

            /// Whether any bit of `other` is set.
            pub const fn intersects(self, other: Self) -> bool {
                self.0.intersects(other.0)
            }

            pub const fn from_vk(flags: $vk_type) -> Self {
                Self(flags)
            }

            pub const fn to_vk(self) -> $vk_type {
                self.0
            }
        }

        impl std::ops::BitOr for $ident {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $ident {
            fn bitor_assign(&mut self, rhs: Self) {
                *self = *self | rhs;
            }
        }
    };
}
