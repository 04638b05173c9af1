//! OAuth scopes requested by the assertion flow.
use std::fmt;

macro_rules! define_scope_enum {
    (
        $(#[$attr:meta])*
        pub enum Scope { $($variant:ident = ($int:literal, $const_name:ident)),* $(,)? }
    ) => {
        $(#[$attr])*
        #[repr(u8)]
        pub enum Scope {
            $(
                $variant = $int,
            )*
        }

        bitflags::bitflags! {
            $(#[$attr])*
            pub struct Scopes: u8 {
                $(
                    const $const_name = $int;
                )*
            }
        }

        impl From<Scope> for Scopes {
            #[inline]
            fn from(scope: Scope) -> Scopes {
                Scopes::from_bits_retain(scope as u8)
            }
        }

        impl Scope {
            #[inline]
            pub const fn from_int(int: u8) -> Option<Self> {
                match int {
                    $(
                        $int => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            #[inline]
            pub const fn scope_uri(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => urls::$const_name,
                    )*
                }
            }
        }
    };
}

define_scope_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Scope {
        CloudPlatform         = (0x01, CLOUD_PLATFORM),
        CloudPlatformReadOnly = (0x02, CLOUD_PLATFORM_READ_ONLY),
        BigQuery              = (0x04, BIG_QUERY),
        BigQueryInsertData    = (0x08, BIG_QUERY_INSERT_DATA),
        BigQueryReadOnly      = (0x10, BIG_QUERY_READ_ONLY),
    }
}

pub(crate) mod urls {
    pub const CLOUD_PLATFORM: &str = "https://www.googleapis.com/auth/cloud-platform";
    pub const CLOUD_PLATFORM_READ_ONLY: &str =
        "https://www.googleapis.com/auth/cloud-platform.read-only";
    pub const BIG_QUERY: &str = "https://www.googleapis.com/auth/bigquery";
    pub const BIG_QUERY_INSERT_DATA: &str = "https://www.googleapis.com/auth/bigquery.insertdata";
    pub const BIG_QUERY_READ_ONLY: &str = "https://www.googleapis.com/auth/bigquery.readonly";
}

impl Default for Scopes {
    /// Full read/write access to the warehouse.
    fn default() -> Self {
        Self::BIG_QUERY
    }
}

impl Scopes {
    #[inline]
    pub fn iter_scopes(self) -> impl Iterator<Item = Scope> {
        self.iter().filter_map(|scope| Scope::from_int(scope.bits()))
    }
}

/// Space separated scope URIs, the form the `scope` claim expects.
pub(crate) struct ScopeUris(pub(crate) Scopes);

impl fmt::Display for ScopeUris {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, scope) in self.0.iter_scopes().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }

            f.write_str(scope.scope_uri())?;
        }

        Ok(())
    }
}

pub(crate) fn serialize_scope_uris<S>(scopes: &Scopes, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&ScopeUris(*scopes))
}
