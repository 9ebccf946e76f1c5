//! Text choice enums stored as their label.

/// Declares a `Copy` enum whose variants are stored as fixed strings.
///
/// The generated type converts to and from [`Value`](query_lab_db::Value),
/// parses with `FromStr` and exposes `choices()` for
/// [`FieldDef::choices`](query_lab_db::FieldDef::choices).
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored label.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// `(value, label)` pairs for a field definition.
            pub fn choices() -> Vec<(&'static str, &'static str)> {
                Self::ALL.iter().map(|c| (c.as_str(), c.as_str())).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = query_lab_core::OrmError;

            fn from_str(s: &str) -> query_lab_core::OrmResult<Self> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err(query_lab_core::OrmError::SerializationError(format!(
                        "unknown {} '{other}'",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl From<$name> for query_lab_db::Value {
            fn from(choice: $name) -> Self {
                Self::String(choice.as_str().to_string())
            }
        }

        impl query_lab_db::FromValue for $name {
            fn from_value(value: &query_lab_db::Value) -> query_lab_core::OrmResult<Self> {
                <String as query_lab_db::FromValue>::from_value(value)?.parse()
            }
        }
    };
}

pub(crate) use choice_enum;

#[cfg(test)]
mod tests {
    use query_lab_db::{FromValue, Value};

    choice_enum! {
        /// Test enum.
        Size {
            Small => "S",
            Large => "Large size",
        }
    }

    #[test]
    fn test_labels_round_trip() {
        assert_eq!(Size::Large.as_str(), "Large size");
        assert_eq!("S".parse::<Size>().unwrap(), Size::Small);
        assert_eq!(Size::Small.to_string(), "S");
        assert_eq!(Size::choices(), vec![("S", "S"), ("Large size", "Large size")]);
    }

    #[test]
    fn test_unknown_label() {
        let err = "XL".parse::<Size>().unwrap_err();
        assert!(err.to_string().contains("unknown Size 'XL'"));
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(Value::from(Size::Small), Value::String("S".into()));
        assert_eq!(Size::from_value(&Value::from("Large size")).unwrap(), Size::Large);
        assert!(Size::from_value(&Value::Int(1)).is_err());
    }
}
