use core::any::Any;
use core::{error, fmt};

// -----------------------------------------------------------------------------
// ScalarValue

/// A leaf value with a canonical text form.
///
/// Scalars serialize into a single `value` attribute and parse back from it.
/// The `LABEL` is the value used for the `type` attribute and for registry
/// lookups; it must be unique across all registered types.
///
/// # Examples
///
/// ```
/// use ogx_value::ScalarValue;
///
/// assert_eq!(<i32 as ScalarValue>::LABEL, "i32");
/// assert_eq!(17_i32.render(), "17");
/// assert_eq!(i32::parse("17").unwrap(), 17);
/// assert!(i32::parse("seventeen").is_err());
/// ```
pub trait ScalarValue: Any + Sized {
    /// The registry label of this scalar type.
    const LABEL: &'static str;

    /// Renders the value into its canonical text form.
    fn render(&self) -> String;

    /// Parses a value back from its canonical text form.
    fn parse(text: &str) -> Result<Self, ScalarParseError>;
}

macro_rules! impl_scalar_via_from_str {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl ScalarValue for $ty {
                const LABEL: &'static str = $label;

                #[inline]
                fn render(&self) -> String {
                    self.to_string()
                }

                fn parse(text: &str) -> Result<Self, ScalarParseError> {
                    text.parse::<$ty>()
                        .map_err(|_| ScalarParseError::new($label, text))
                }
            }
        )*
    };
}

impl_scalar_via_from_str! {
    bool => "bool",
    char => "char",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    f32 => "f32",
    f64 => "f64",
}

impl ScalarValue for String {
    const LABEL: &'static str = "String";

    #[inline]
    fn render(&self) -> String {
        self.clone()
    }

    #[inline]
    fn parse(text: &str) -> Result<Self, ScalarParseError> {
        Ok(text.to_string())
    }
}

// -----------------------------------------------------------------------------
// ScalarParseError

/// Error returned when a scalar's text form cannot be parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarParseError {
    label: &'static str,
    text: String,
}

impl ScalarParseError {
    /// Creates a parse error for the given scalar label and offending text.
    #[inline]
    pub fn new(label: &'static str, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }

    /// The label of the scalar type that failed to parse.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The text that failed to parse.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ScalarParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `{}` as scalar `{}`", self.text, self.label)
    }
}

impl error::Error for ScalarParseError {}

// -----------------------------------------------------------------------------
// Tests
