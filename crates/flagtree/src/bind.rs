//! Binding plain Rust fields to flags.
//!
//! A field never aliases a flag's storage: [`FlagField::to_value`] builds an
//! owned [`Value`] seeded with the field's current contents, and after
//! parsing [`FlagField::from_value`] reads the result back. The
//! `#[derive(Flags)]` macro generates the glue for whole structs.

use std::time::Duration;

use crate::error::Result;
use crate::flagset::FlagSet;
use crate::value::Value;

/// A field type that can be stored in a flag.
pub trait FlagField: Sized {
    /// Build a Value whose zero state is `self`.
    fn to_value(&self) -> Value;

    /// Read the Value back; `None` when the variant does not match.
    fn from_value(value: &Value) -> Option<Self>;
}

/// A struct whose fields are registered as flags.
///
/// Usually derived:
///
/// ```
/// use flagtree::Flags;
///
/// #[derive(Default, Flags)]
/// struct Opt {
///     #[flag(short = 'v', help = "Verbose output")]
///     verbose: bool,
///     #[flag(default = "100")]
///     max_conn: u32,
/// }
///
/// let mut opt = Opt::default();
/// let mut set = opt.flag_set("opt").unwrap();
/// set.parse(&["-v"]).unwrap();
/// opt.load(&set);
/// assert!(opt.verbose);
/// assert_eq!(opt.max_conn, 100);
/// ```
pub trait Flags {
    /// Register one flag per field on `set`.
    fn register(&self, set: &mut FlagSet) -> Result<()>;

    /// Copy parsed values from `set` back into the fields.
    fn load(&mut self, set: &FlagSet);

    /// Build a new flag set named `name` holding this struct's flags.
    fn flag_set(&self, name: &str) -> Result<FlagSet> {
        let mut set = FlagSet::new(name);
        self.register(&mut set)?;
        Ok(set)
    }
}

impl FlagField for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FlagField for Vec<bool> {
    fn to_value(&self) -> Value {
        Value::BoolList(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::BoolList(list) => Some(list.clone()),
            _ => None,
        }
    }
}

macro_rules! signed_field {
    ($($ty:ty),*) => {$(
        impl FlagField for $ty {
            fn to_value(&self) -> Value {
                Value::Int { bits: <$ty>::BITS, value: *self as i64 }
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int { value, .. } => <$ty>::try_from(*value).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($ty:ty),*) => {$(
        impl FlagField for $ty {
            fn to_value(&self) -> Value {
                Value::Uint { bits: <$ty>::BITS, value: *self as u64 }
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Uint { value, .. } => <$ty>::try_from(*value).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl FlagField for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FlagField for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f as f32),
            _ => None,
        }
    }
}

impl FlagField for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FlagField for Vec<String> {
    fn to_value(&self) -> Value {
        Value::StringList(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringList(list) => Some(list.clone()),
            _ => None,
        }
    }
}

impl FlagField for Duration {
    fn to_value(&self) -> Value {
        Value::Duration(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_fields_carry_their_width() {
        assert!(matches!(7i16.to_value(), Value::Int { bits: 16, value: 7 }));
        assert!(matches!(7u8.to_value(), Value::Uint { bits: 8, value: 7 }));
        assert_eq!(u8::from_value(&Value::Uint { bits: 64, value: 300 }), None);
        assert_eq!(i32::from_value(&Value::Int { bits: 32, value: -3 }), Some(-3));
    }

    #[test]
    fn mismatched_variants_read_back_as_none() {
        assert_eq!(bool::from_value(&Value::String("true".into())), None);
        assert_eq!(String::from_value(&Value::Bool(true)), None);
    }

    #[test]
    fn seeded_value_is_the_zero_state() {
        let mut value = vec!["base".to_string()].to_value();
        value.set("extra").unwrap();
        assert_eq!(
            Vec::<String>::from_value(&value),
            Some(vec!["base".to_string(), "extra".to_string()])
        );
    }
}
