//! Macros for defining typed ID types.

/// Macro to define a typed ID bound to one [`ResourceKind`](crate::ResourceKind).
///
/// This generates a newtype wrapper around [`RemoteId`](crate::RemoteId) with:
/// - A `KIND` constant
/// - `parse()` to validate a raw string
/// - `to_ref()` to qualify the ID with its kind
/// - `Display` and `FromStr` implementations
/// - `Serialize` and `Deserialize` implementations (plain string form)
/// - `TryFrom<ResourceRef>` that checks the kind
///
/// # Example
///
/// ```ignore
/// define_id!(AccountId, Account);
///
/// let id: AccountId = "8d5f0f42-3c38-4a3e-9d53-4b4a2f8f9c11".parse()?;
/// assert_eq!(id.to_ref().to_string(), "account:8d5f0f42-3c38-4a3e-9d53-4b4a2f8f9c11");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $kind:ident) => {
        /// A typed remote ID for this resource kind.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::RemoteId);

        impl $name {
            /// The resource kind this ID refers to.
            pub const KIND: $crate::ResourceKind = $crate::ResourceKind::$kind;

            /// Wraps an already validated remote ID.
            #[must_use]
            pub const fn from_remote(id: $crate::RemoteId) -> Self {
                Self(id)
            }

            /// Parses and validates an ID from a string.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                $crate::RemoteId::parse(s).map(Self)
            }

            /// Returns the untyped remote ID.
            #[must_use]
            pub fn as_remote(&self) -> &$crate::RemoteId {
                &self.0
            }

            /// Returns the raw identifier string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Qualifies this ID with its kind.
            #[must_use]
            pub fn to_ref(&self) -> $crate::ResourceRef {
                $crate::ResourceRef::new(Self::KIND, self.0.clone())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$name> for $crate::RemoteId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl TryFrom<$crate::ResourceRef> for $name {
            type Error = $crate::IdError;

            fn try_from(r: $crate::ResourceRef) -> Result<Self, Self::Error> {
                if r.kind != Self::KIND {
                    return Err($crate::IdError::KindMismatch {
                        expected: Self::KIND.as_str(),
                        actual: r.kind.as_str(),
                    });
                }
                Ok(Self(r.id))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}
