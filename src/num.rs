use alloy::primitives::U256;
use fastnum::{
    UD128, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Error of decimal string normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumError {
    #[error("malformed decimal {0:?}")]
    Malformed(String),

    #[error("decimal {0:?} does not fit into {1} fractional digits")]
    Overflow(String, u8),
}

/// Decimal string to fixed-point converter.
///
/// Ledger receipts carry amounts and prices as decimal strings, replies carry
/// them as integers scaled by `10^decimals`, so `"1.5"` with 8 decimals
/// becomes `150000000`. Digits beyond the precision are rounded half-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Converter {
    decimals: u8,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self { decimals }
    }

    /// Number of fractional digits of the fixed-point representation.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Parses a decimal string into the scaled integer.
    ///
    /// Negative, non-finite and out-of-range values are rejected as a whole,
    /// a partially converted value is never returned.
    pub fn normalize(&self, value: &str) -> Result<i64, NumError> {
        let parsed = UD128::from_str(value.trim(), Self::context())
            .map_err(|_| NumError::Malformed(value.to_string()))?;
        if !parsed.is_finite() {
            return Err(NumError::Malformed(value.to_string()));
        }
        if parsed > self.max() {
            return Err(NumError::Overflow(value.to_string(), self.decimals));
        }
        let scaled = self.to_unsigned(parsed);
        if scaled > U256::from(i64::MAX as u64) {
            return Err(NumError::Overflow(value.to_string(), self.decimals));
        }
        Ok(scaled.to::<u64>() as i64)
    }

    /// Inverse of [`Self::normalize`], used to render stored integers back
    /// into receipt strings.
    pub fn to_decimal(&self, value: i64) -> UD128 {
        self.from_unsigned(U256::from(value.unsigned_abs()))
    }

    fn max(&self) -> UD128 {
        self.from_unsigned(U256::from(i64::MAX as u64))
    }

    fn context() -> Context {
        Context::default().with_rounding_mode(RoundingMode::HalfUp)
    }

    fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(unscaled, -(self.decimals as i32), Self::context())
    }

    fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_normalize_scales_by_precision() {
        let conv = Converter::new(8);
        assert_eq!(conv.normalize("1.50000000"), Ok(150000000));
        assert_eq!(conv.normalize("1.5"), Ok(150000000));
        assert_eq!(conv.normalize("0"), Ok(0));
        assert_eq!(conv.normalize("20"), Ok(2000000000));
        assert_eq!(Converter::new(0).normalize("1234567890"), Ok(1234567890));
        assert_eq!(Converter::new(6).normalize("1234.56789"), Ok(1234567890));
    }

    #[test]
    fn test_normalize_is_linear() {
        let conv = Converter::new(8);
        assert_eq!(
            conv.normalize("0.1").unwrap() * 10,
            conv.normalize("1.0").unwrap()
        );
        assert_eq!(
            conv.normalize("0.00000001").unwrap() * 100000000,
            conv.normalize("1").unwrap()
        );
    }

    #[test]
    fn test_normalize_rounds_extra_digits() {
        let conv = Converter::new(2);
        assert_eq!(conv.normalize("0.125"), Ok(13));
        assert_eq!(conv.normalize("0.124"), Ok(12));
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        let conv = Converter::new(8);
        assert!(matches!(conv.normalize(""), Err(NumError::Malformed(_))));
        assert!(matches!(conv.normalize("abc"), Err(NumError::Malformed(_))));
        assert!(matches!(conv.normalize("-1"), Err(NumError::Malformed(_))));
        assert!(matches!(conv.normalize("1.2.3"), Err(NumError::Malformed(_))));
    }

    #[test]
    fn test_normalize_rejects_overflow() {
        let conv = Converter::new(8);
        assert!(matches!(
            conv.normalize("100000000000"),
            Err(NumError::Overflow(_, 8))
        ));
        assert_eq!(conv.normalize("92233720368.54775807"), Ok(i64::MAX));
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Converter::new(8).to_decimal(150000000), udec128!(1.5));
        assert_eq!(Converter::new(0).to_decimal(42), udec128!(42));
    }
}
