use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapter::{adapter_fn, typed, AdapterFactory, NullSafe, TypeAdapter, TypedAdapter};
use crate::error::{Error, Result};
use crate::registry::FactoryContext;
use crate::signature::{builtin, TypeSignature};
use crate::stream::{Token, TokenReader, TokenWriter};
use crate::value::Number;

/// Adapters for the integral and floating-point types, `bool`, `char` and
/// `String`. Every adapter is null-safe.
///
/// Integral reads are strict: a fraction, an exponent or an out-of-range
/// literal fails with [`Error::NumericRange`] instead of being coerced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveFactory;

impl AdapterFactory for PrimitiveFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        let TypeSignature::Class(class) = signature else {
            return Ok(None);
        };
        let special_floats = context.options().serialize_special_floats;
        let adapter = match class.name() {
            builtin::I8 => integral::<i8>(),
            builtin::I16 => integral::<i16>(),
            builtin::I32 => integral::<i32>(),
            builtin::I64 => integral::<i64>(),
            builtin::U8 => integral::<u8>(),
            builtin::U16 => integral::<u16>(),
            builtin::U32 => integral::<u32>(),
            builtin::U64 => integral::<u64>(),
            builtin::F32 => typed(F32Adapter { special_floats }),
            builtin::F64 => typed(F64Adapter { special_floats }),
            builtin::BOOL => bool_adapter(),
            builtin::CHAR => char_adapter(),
            builtin::STRING => string_adapter(),
            _ => return Ok(None),
        };
        Ok(Some(NullSafe::wrap(adapter)))
    }
}

trait Integral: Any + Copy + FromStr + Send + Sync {
    const NAME: &'static str;

    fn write_to(self, out: &mut dyn TokenWriter) -> Result<()>;
}

macro_rules! integral_impl {
    ($($t:ty => $name:expr, $via:ident as $wide:ty);* $(;)?) => {
        $(
            impl Integral for $t {
                const NAME: &'static str = $name;

                fn write_to(self, out: &mut dyn TokenWriter) -> Result<()> {
                    out.$via(<$wide>::from(self))
                }
            }
        )*
    };
}

integral_impl! {
    i8 => builtin::I8, i64_value as i64;
    i16 => builtin::I16, i64_value as i64;
    i32 => builtin::I32, i64_value as i64;
    i64 => builtin::I64, i64_value as i64;
    u8 => builtin::U8, i64_value as i64;
    u16 => builtin::U16, i64_value as i64;
    u32 => builtin::U32, i64_value as i64;
    u64 => builtin::U64, u64_value as u64;
}

fn integral<T: Integral>() -> Arc<dyn TypeAdapter> {
    adapter_fn(
        |out: &mut dyn TokenWriter, value: &T| value.write_to(out),
        |reader: &mut dyn TokenReader| {
            let literal = reader.next_number()?;
            literal
                .parse::<T>()
                .map_err(|_| Error::numeric_range(&literal, T::NAME))
        },
    )
}

/// Reads any number literal as an `f64`. Non-finite values need a lenient
/// reader.
fn read_float(reader: &mut dyn TokenReader, target: &str) -> Result<f64> {
    let literal = reader.next_number()?;
    let value = Number::parse(&literal)
        .map(|n| n.as_f64())
        .ok_or_else(|| Error::numeric_range(&literal, target))?;
    if !value.is_finite() && !reader.is_lenient() {
        return Err(Error::numeric_range(&literal, target));
    }
    Ok(value)
}

fn check_special(value: f64, special_floats: bool, target: &str) -> Result<()> {
    if value.is_finite() || special_floats {
        Ok(())
    } else {
        Err(Error::numeric_range(
            &format!("{value} (enable special floating-point values to write it)"),
            target,
        ))
    }
}

struct F64Adapter {
    special_floats: bool,
}

impl TypedAdapter<f64> for F64Adapter {
    fn write(&self, out: &mut dyn TokenWriter, value: &f64) -> Result<()> {
        check_special(*value, self.special_floats, builtin::F64)?;
        out.f64_value(*value)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<f64> {
        read_float(reader, builtin::F64)
    }
}

struct F32Adapter {
    special_floats: bool,
}

impl TypedAdapter<f32> for F32Adapter {
    fn write(&self, out: &mut dyn TokenWriter, value: &f32) -> Result<()> {
        let value = *value;
        check_special(f64::from(value), self.special_floats, builtin::F32)?;
        // Widen through the shortest decimal form so 0.1f32 writes as 0.1.
        let widened = value.to_string().parse::<f64>().unwrap_or(f64::from(value));
        out.f64_value(widened)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<f32> {
        let value = read_float(reader, builtin::F32)?;
        let narrowed = value as f32;
        if value.is_finite() && !narrowed.is_finite() {
            return Err(Error::numeric_range(&value.to_string(), builtin::F32));
        }
        Ok(narrowed)
    }
}

fn bool_adapter() -> Arc<dyn TypeAdapter> {
    adapter_fn(
        |out: &mut dyn TokenWriter, value: &bool| out.bool_value(*value),
        |reader: &mut dyn TokenReader| {
            if reader.peek()? == Token::String {
                return Ok(reader.next_string()?.eq_ignore_ascii_case("true"));
            }
            reader.next_bool()
        },
    )
}

fn char_adapter() -> Arc<dyn TypeAdapter> {
    adapter_fn(
        |out: &mut dyn TokenWriter, value: &char| out.string_value(value.encode_utf8(&mut [0; 4])),
        |reader: &mut dyn TokenReader| {
            let text = reader.next_string()?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok(ch),
                _ => Err(Error::malformed("a single character", format!("{text:?}"), &reader.path())),
            }
        },
    )
}

fn string_adapter() -> Arc<dyn TypeAdapter> {
    adapter_fn(
        |out: &mut dyn TokenWriter, value: &String| out.string_value(value),
        |reader: &mut dyn TokenReader| {
            if reader.peek()? == Token::Bool {
                return Ok(reader.next_bool()?.to_string());
            }
            reader.next_string()
        },
    )
}
