//! # Option Descriptors
//!
//! Static metadata for one configuration item: its name, declared type,
//! default value and converter.

use crate::convert::OptionValue;
use errors::ConversionError;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Semantic type tag of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Float,
    Boolean,
    /// Enumeration with the given variant names.
    Enum(&'static [&'static str]),
    List(Box<OptionKind>),
    /// Type handled by a custom converter.
    Custom(Cow<'static, str>),
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Enum(variants) => write!(f, "enum[{}]", variants.join("|")),
            Self::List(item) => write!(f, "list<{item}>"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// Parse/format pair for one option type.
pub trait ValueConverter<T>: Send + Sync {
    fn parse(&self, raw: &str) -> Result<T, String>;

    fn format(&self, value: &T) -> Result<String, String>;

    fn kind(&self) -> OptionKind;
}

/// Converter backed by [`OptionValue`].
struct Canonical;

impl<T: OptionValue> ValueConverter<T> for Canonical {
    fn parse(&self, raw: &str) -> Result<T, String> {
        T::from_raw(raw)
    }

    fn format(&self, value: &T) -> Result<String, String> {
        value.try_to_raw()
    }

    fn kind(&self) -> OptionKind {
        T::kind()
    }
}

/// Converter built from a pair of closures.
///
/// ```rust
/// use resolver::{FnConverter, OptionDescriptor};
/// use std::time::Duration;
///
/// let timeout = OptionDescriptor::custom(
///     "http.timeout",
///     FnConverter::new(
///         "duration_ms",
///         |raw: &str| raw.trim().parse::<u64>().map(Duration::from_millis).map_err(|e| e.to_string()),
///         |value: &Duration| Ok(value.as_millis().to_string()),
///     ),
/// );
/// assert_eq!(timeout.kind().to_string(), "duration_ms");
/// ```
pub struct FnConverter<P, F> {
    type_name: Cow<'static, str>,
    parse: P,
    format: F,
}

impl<P, F> FnConverter<P, F> {
    pub fn new(type_name: impl Into<Cow<'static, str>>, parse: P, format: F) -> Self {
        Self {
            type_name: type_name.into(),
            parse,
            format,
        }
    }
}

impl<T, P, F> ValueConverter<T> for FnConverter<P, F>
where
    P: Fn(&str) -> Result<T, String> + Send + Sync,
    F: Fn(&T) -> Result<String, String> + Send + Sync,
{
    fn parse(&self, raw: &str) -> Result<T, String> {
        (self.parse)(raw)
    }

    fn format(&self, value: &T) -> Result<String, String> {
        (self.format)(value)
    }

    fn kind(&self) -> OptionKind {
        OptionKind::Custom(self.type_name.clone())
    }
}

/// Declaration of one typed option.
///
/// Descriptors are immutable once built and cheap to clone; the converter is
/// shared.
pub struct OptionDescriptor<T> {
    name: Arc<str>,
    default: Option<T>,
    zero: T,
    converter: Arc<dyn ValueConverter<T>>,
    custom_converter: bool,
}

impl<T: OptionValue> OptionDescriptor<T> {
    /// Declare an option converted with the canonical converter for `T`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            default: None,
            zero: T::zero(),
            converter: Arc::new(Canonical),
            custom_converter: false,
        }
    }
}

impl<T> OptionDescriptor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Declare an option of a type without canonical conversion.
    ///
    /// `T::default()` stands in as the zero value.
    pub fn custom<C>(name: impl Into<String>, converter: C) -> Self
    where
        T: Default,
        C: ValueConverter<T> + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            default: None,
            zero: T::default(),
            converter: Arc::new(converter),
            custom_converter: true,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    /// Replace the converter. Custom converters take precedence over the
    /// canonical one.
    #[must_use]
    pub fn with_converter<C>(mut self, converter: C) -> Self
    where
        C: ValueConverter<T> + 'static,
    {
        self.converter = Arc::new(converter);
        self.custom_converter = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OptionKind {
        self.converter.kind()
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn has_custom_converter(&self) -> bool {
        self.custom_converter
    }

    /// Type-erased summary used by the resolver's option registry.
    pub fn info(&self) -> OptionInfo {
        OptionInfo {
            name: self.name.to_string(),
            kind: self.kind(),
            has_default: self.default.is_some(),
        }
    }

    /// Declared default, else the zero value of the type.
    pub(crate) fn fallback(&self) -> T {
        self.default.clone().unwrap_or_else(|| self.zero.clone())
    }

    pub(crate) fn parse(&self, raw: &str) -> Result<T, ConversionError> {
        self.converter
            .parse(raw)
            .map_err(|reason| ConversionError::new(self.name(), raw, self.kind().to_string(), reason))
    }

    pub(crate) fn format(&self, value: &T) -> Result<String, ConversionError> {
        self.converter.format(value).map_err(|reason| {
            ConversionError::new(self.name(), String::new(), self.kind().to_string(), reason)
        })
    }
}

impl<T: Clone> Clone for OptionDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            default: self.default.clone(),
            zero: self.zero.clone(),
            converter: Arc::clone(&self.converter),
            custom_converter: self.custom_converter,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OptionDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("name", &self.name)
            .field("kind", &self.converter.kind())
            .field("default", &self.default)
            .field("custom_converter", &self.custom_converter)
            .finish()
    }
}

/// Declared option as recorded by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionInfo {
    pub name: String,
    pub kind: OptionKind,
    pub has_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper_converter() -> impl ValueConverter<String> {
        FnConverter::new(
            "upper",
            |raw: &str| Ok(raw.to_uppercase()),
            |value: &String| Ok(value.to_lowercase()),
        )
    }

    #[test]
    fn test_fallback_prefers_default_over_zero() {
        let plain = OptionDescriptor::<i64>::new("retries");
        assert_eq!(plain.fallback(), 0);
        assert_eq!(plain.default_value(), None);

        let with_default = OptionDescriptor::<i64>::new("retries").with_default(3);
        assert_eq!(with_default.fallback(), 3);
        assert_eq!(with_default.default_value(), Some(&3));
    }

    #[test]
    fn test_parse_failure_carries_context() {
        let port = OptionDescriptor::<u16>::new("server.port");
        let err = port.parse("eighty").unwrap_err();
        assert_eq!(err.option_name, "server.port");
        assert_eq!(err.raw_value, "eighty");
        assert_eq!(err.target_type, "integer");
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn test_custom_converter_takes_precedence() {
        let name = OptionDescriptor::<String>::new("service.name").with_converter(upper_converter());
        assert!(name.has_custom_converter());
        assert_eq!(name.parse("billing").unwrap(), "BILLING");
        assert_eq!(name.format(&"BILLING".to_string()).unwrap(), "billing");
        assert_eq!(name.kind(), OptionKind::Custom(Cow::Borrowed("upper")));
    }

    #[test]
    fn test_custom_descriptor_uses_type_default_as_zero() {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Endpoint(String);

        let endpoint = OptionDescriptor::custom(
            "upstream",
            FnConverter::new(
                "endpoint",
                |raw: &str| Ok(Endpoint(raw.to_string())),
                |value: &Endpoint| Ok(value.0.clone()),
            ),
        );
        assert_eq!(endpoint.fallback(), Endpoint::default());
    }

    #[test]
    fn test_format_failure_is_conversion_error() {
        let strict = OptionDescriptor::<String>::new("token").with_converter(FnConverter::new(
            "token",
            |raw: &str| Ok(raw.to_string()),
            |value: &String| {
                if value.is_empty() {
                    Err("empty token".to_string())
                } else {
                    Ok(value.clone())
                }
            },
        ));
        let err = strict.format(&String::new()).unwrap_err();
        assert_eq!(err.option_name, "token");
        assert_eq!(err.reason, "empty token");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OptionKind::Integer.to_string(), "integer");
        assert_eq!(
            OptionKind::List(Box::new(OptionKind::Boolean)).to_string(),
            "list<boolean>"
        );
        assert_eq!(OptionKind::Enum(&["a", "b"]).to_string(), "enum[a|b]");
    }

    #[test]
    fn test_info_summarises_declaration() {
        let info = OptionDescriptor::<Vec<String>>::new("hosts")
            .with_default(vec!["a".to_string()])
            .info();
        assert_eq!(info.name, "hosts");
        assert_eq!(info.kind, OptionKind::List(Box::new(OptionKind::String)));
        assert!(info.has_default);
    }
}
