//! Declarative macros for closed-set wire types: `tls_enum_u8!` and
//! `tls_struct!`, generating code against this crate's own `Cursor`/`Result`
//! types.

/// Declares a `Copy` enum backed by a single `u8` on the wire, with a
/// catch-all `unknown(u8)` variant for values the RFC registry does not (yet)
/// name. Mirrors the registry-closed style used throughout TLS (content
/// types, alert levels/descriptions, handshake types, ...).
#[macro_export]
macro_rules! tls_enum_u8 {
    ($name:ident => $($variant:ident($value:expr)),+ $(,)?) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            unknown(u8),
        }

        impl $name {
            pub fn to_u8(&self) -> u8 {
                match self {
                    $($name::$variant => $value,)+
                    $name::unknown(v) => *v,
                }
            }

            pub fn from_u8(v: u8) -> Self {
                match v {
                    $($value => $name::$variant,)+
                    other => $name::unknown(other),
                }
            }

            pub fn parse(cursor: &mut $crate::parsing::Cursor) -> $crate::error::Result<Self> {
                Ok(Self::from_u8(cursor.read_u8()?))
            }

            pub fn serialize(&self, out: &mut Vec<u8>) {
                out.push(self.to_u8());
            }
        }
    };
}

/// Declares a struct whose fields are parsed/serialized in declaration
/// order, each via the field type's own `parse`/`serialize`.
#[macro_export]
macro_rules! tls_struct {
    ($name:ident => { $($field:ident : $typ:ty),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $typ,)+
        }

        impl $name {
            pub fn parse(cursor: &mut $crate::parsing::Cursor) -> $crate::error::Result<Self> {
                $(let $field = <$typ>::parse(cursor)?;)+
                Ok($name { $($field,)+ })
            }

            pub fn serialize(&self, out: &mut Vec<u8>) {
                $(self.$field.serialize(out);)+
            }
        }
    };
}
