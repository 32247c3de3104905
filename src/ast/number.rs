use crate::error::MathError;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// The result of evaluating an expression.
///
/// Integer arithmetic stays in `Integer` until a float operand, a true division
/// or a negative exponent promotes it. Integer overflow is a `MathError`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// True for integers and for finite floats without a fractional part.
    pub fn is_integral(self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(value) => value.is_finite() && value.fract() == 0.0,
        }
    }

    /// Division rounding toward negative infinity.
    pub fn floor_div(self, rhs: Number) -> Result<Number, MathError> {
        match (self, rhs) {
            (Number::Integer(_), Number::Integer(0)) => Err(MathError::FloorDivisionByZero),
            (Number::Integer(a), Number::Integer(b)) => {
                let quotient = a.checked_div(b).ok_or(MathError::Overflow)?;
                if a % b != 0 && (a < 0) != (b < 0) {
                    Ok(Number::Integer(quotient - 1))
                } else {
                    Ok(Number::Integer(quotient))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(MathError::FloorDivisionByZero);
                }
                Ok(Number::Float(float_div_mod(a, b).0))
            }
        }
    }

    pub fn pow(self, rhs: Number) -> Result<Number, MathError> {
        match (self, rhs) {
            (Number::Integer(base), Number::Integer(exponent)) if exponent >= 0 => {
                integer_pow(base, exponent).map(Number::Integer)
            }
            (Number::Integer(0), Number::Integer(_)) => Err(MathError::ZeroToNegativePower),
            (base, exponent) => float_pow(base.as_f64(), exponent.as_f64()).map(Number::Float),
        }
    }
}

fn integer_pow(base: i64, exponent: i64) -> Result<i64, MathError> {
    match u32::try_from(exponent) {
        Ok(exponent) => base.checked_pow(exponent).ok_or(MathError::Overflow),
        // Only 0, 1 and -1 survive an exponent this large.
        Err(_) => match base {
            0 | 1 => Ok(base),
            -1 if exponent % 2 == 0 => Ok(1),
            -1 => Ok(-1),
            _ => Err(MathError::Overflow),
        },
    }
}

fn float_pow(base: f64, exponent: f64) -> Result<f64, MathError> {
    if exponent == 0.0 {
        return Ok(1.0);
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(MathError::ZeroToNegativePower);
    }
    if base < 0.0 && base.is_finite() && exponent.is_finite() && exponent.fract() != 0.0 {
        return Err(MathError::ComplexResult);
    }
    let result = base.powf(exponent);
    if result.is_infinite() && base.is_finite() && exponent.is_finite() {
        return Err(MathError::Overflow);
    }
    Ok(result)
}

/// Floored quotient and remainder of two floats, the remainder carrying the
/// sign of `b`. `b` must be non-zero.
fn float_div_mod(a: f64, b: f64) -> (f64, f64) {
    let mut remainder = a % b;
    let mut quotient = (a - remainder) / b;
    if remainder != 0.0 {
        if (b < 0.0) != (remainder < 0.0) {
            remainder += b;
            quotient -= 1.0;
        }
    } else {
        remainder = 0.0_f64.copysign(b);
    }
    let floored = if quotient != 0.0 {
        let floor = quotient.floor();
        if quotient - floor > 0.5 {
            floor + 1.0
        } else {
            floor
        }
    } else {
        0.0_f64.copysign(a / b)
    };
    (floored, remainder)
}

impl Add for Number {
    type Output = Result<Number, MathError>;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => {
                a.checked_add(b).map(Number::Integer).ok_or(MathError::Overflow)
            }
            (a, b) => Ok(Number::Float(a.as_f64() + b.as_f64())),
        }
    }
}

impl Sub for Number {
    type Output = Result<Number, MathError>;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => {
                a.checked_sub(b).map(Number::Integer).ok_or(MathError::Overflow)
            }
            (a, b) => Ok(Number::Float(a.as_f64() - b.as_f64())),
        }
    }
}

impl Mul for Number {
    type Output = Result<Number, MathError>;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => {
                a.checked_mul(b).map(Number::Integer).ok_or(MathError::Overflow)
            }
            (a, b) => Ok(Number::Float(a.as_f64() * b.as_f64())),
        }
    }
}

impl Div for Number {
    type Output = Result<Number, MathError>;

    /// True division, always a float.
    fn div(self, rhs: Self) -> Self::Output {
        let (a, b) = (self.as_f64(), rhs.as_f64());
        if b == 0.0 {
            Err(MathError::DivisionByZero)
        } else {
            Ok(Number::Float(a / b))
        }
    }
}

impl Rem for Number {
    type Output = Result<Number, MathError>;

    /// Remainder with the sign of the divisor.
    fn rem(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Integer(_), Number::Integer(0)) => Err(MathError::ModuloByZero),
            (Number::Integer(a), Number::Integer(b)) => {
                let remainder = a.wrapping_rem(b);
                if remainder != 0 && (remainder < 0) != (b < 0) {
                    Ok(Number::Integer(remainder + b))
                } else {
                    Ok(Number::Integer(remainder))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(MathError::ModuloByZero);
                }
                Ok(Number::Float(float_div_mod(a, b).1))
            }
        }
    }
}

impl Neg for Number {
    type Output = Result<Number, MathError>;

    fn neg(self) -> Self::Output {
        match self {
            Number::Integer(value) => value
                .checked_neg()
                .map(Number::Integer)
                .ok_or(MathError::Overflow),
            Number::Float(value) => Ok(Number::Float(-value)),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(value) => write!(f, "{}", value),
            Number::Float(value) => f.write_str(&float_repr(*value)),
        }
    }
}

/// Shortest round-trip text for a float, always marked as a float: `4.0`,
/// `0.1`, `1e+16`, `1.5e-07`, `inf`.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{:e}", value);
        return match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => scientific,
        };
    }
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
