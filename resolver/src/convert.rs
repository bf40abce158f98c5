//! # Type Conversion
//!
//! Canonical conversion between raw store text and Rust values.
//!
//! # Formats
//! - Strings pass through untouched
//! - Integers and floats are parsed locale-invariant after trimming
//! - Booleans accept `true`, `false`, `1`, `0` in any case
//! - Lists are comma separated, each item converted with its own type
//! - Enums match variant names case-insensitively (see [`enum_option!`])

use crate::option::OptionKind;

/// A type with a canonical raw representation.
///
/// `zero` is the value returned when no store supplies the option and the
/// descriptor declares no default.
pub trait OptionValue: Clone + Send + Sync + 'static {
    fn kind() -> OptionKind;

    fn zero() -> Self;

    /// Parse raw store text. The error is a human readable reason.
    fn from_raw(raw: &str) -> Result<Self, String>;

    fn to_raw(&self) -> String;

    /// Like [`OptionValue::to_raw`], but fails for values whose raw form
    /// would not parse back to the same value.
    fn try_to_raw(&self) -> Result<String, String> {
        Ok(self.to_raw())
    }
}

impl OptionValue for String {
    fn kind() -> OptionKind {
        OptionKind::String
    }

    fn zero() -> Self {
        String::new()
    }

    fn from_raw(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn to_raw(&self) -> String {
        self.clone()
    }
}

macro_rules! numeric_option {
    ($kind:ident, $zero:expr; $($ty:ty),+) => {$(
        impl OptionValue for $ty {
            fn kind() -> OptionKind {
                OptionKind::$kind
            }

            fn zero() -> Self {
                $zero
            }

            fn from_raw(raw: &str) -> Result<Self, String> {
                raw.trim().parse::<$ty>().map_err(|e| e.to_string())
            }

            fn to_raw(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

numeric_option!(Integer, 0; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
numeric_option!(Float, 0.0; f32, f64);

impl OptionValue for bool {
    fn kind() -> OptionKind {
        OptionKind::Boolean
    }

    fn zero() -> Self {
        false
    }

    fn from_raw(raw: &str) -> Result<Self, String> {
        parse_bool(raw)
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl<T: OptionValue> OptionValue for Vec<T> {
    fn kind() -> OptionKind {
        OptionKind::List(Box::new(T::kind()))
    }

    fn zero() -> Self {
        Vec::new()
    }

    fn from_raw(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        raw.split(LIST_DELIMITER)
            .enumerate()
            .map(|(index, item)| {
                T::from_raw(item.trim()).map_err(|e| format!("item {index} ({item:?}): {e}"))
            })
            .collect()
    }

    fn to_raw(&self) -> String {
        self.iter()
            .map(OptionValue::to_raw)
            .collect::<Vec<_>>()
            .join(&LIST_DELIMITER.to_string())
    }

    fn try_to_raw(&self) -> Result<String, String> {
        let items = self
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let raw = item.try_to_raw()?;
                if raw.contains(LIST_DELIMITER) || raw.trim() != raw {
                    return Err(format!(
                        "item {index} ({raw:?}) contains the list delimiter or surrounding whitespace"
                    ));
                }
                Ok(raw)
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(items.join(&LIST_DELIMITER.to_string()))
    }
}

/// Separator between list items in raw form.
///
/// There is no escaping: items containing it, or with leading or trailing
/// whitespace, cannot be written.
pub const LIST_DELIMITER: char = ',';

/// Parse a boolean from the fixed token set `true`/`false`/`1`/`0`.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    let token = raw.trim();
    if token.eq_ignore_ascii_case("true") || token == "1" {
        Ok(true)
    } else if token.eq_ignore_ascii_case("false") || token == "0" {
        Ok(false)
    } else {
        Err("expected one of true, false, 1, 0".to_string())
    }
}

/// Find the variant whose name matches `raw`, ignoring ASCII case.
pub fn lookup_variant<E>(variants: &[E], raw: &str) -> Result<E, String>
where
    E: Clone,
    for<'a> &'a E: Into<&'static str>,
{
    let wanted = raw.trim();
    variants
        .iter()
        .find(|variant| {
            let name: &'static str = (*variant).into();
            name.eq_ignore_ascii_case(wanted)
        })
        .cloned()
        .ok_or_else(|| {
            let names: Vec<&'static str> = variants.iter().map(Into::into).collect();
            format!("expected one of {}", names.join(", "))
        })
}

/// Implement [`OptionValue`] for fieldless enums.
///
/// The enum must derive `strum::VariantArray`, `strum::VariantNames`,
/// `strum::IntoStaticStr` and `Clone`. Its zero value is the first variant.
///
/// ```rust
/// use resolver::{enum_option, OptionValue};
///
/// #[derive(Debug, Clone, PartialEq, strum::VariantArray, strum::VariantNames, strum::IntoStaticStr)]
/// #[strum(serialize_all = "lowercase")]
/// enum LogFormat {
///     Text,
///     Json,
/// }
///
/// enum_option!(LogFormat);
///
/// assert_eq!(LogFormat::from_raw("JSON"), Ok(LogFormat::Json));
/// assert_eq!(LogFormat::zero(), LogFormat::Text);
/// ```
#[macro_export]
macro_rules! enum_option {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::OptionValue for $ty {
            fn kind() -> $crate::OptionKind {
                $crate::OptionKind::Enum(<$ty as $crate::__private::VariantNames>::VARIANTS)
            }

            fn zero() -> Self {
                <$ty as $crate::__private::VariantArray>::VARIANTS[0].clone()
            }

            fn from_raw(raw: &str) -> ::core::result::Result<Self, ::std::string::String> {
                $crate::convert::lookup_variant(
                    <$ty as $crate::__private::VariantArray>::VARIANTS,
                    raw,
                )
            }

            fn to_raw(&self) -> ::std::string::String {
                let name: &'static str = self.into();
                name.to_string()
            }
        }
    )+};
}
