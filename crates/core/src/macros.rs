/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum stored as
/// an upper-case string.
macro_rules! string_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::errors::Error;

            fn from_str(s: &str) -> $crate::errors::Result<Self> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err($crate::errors::Error::invalid_input(format!(
                        "Unknown {} '{}'",
                        $label, other
                    ))),
                }
            }
        }
    };
}
