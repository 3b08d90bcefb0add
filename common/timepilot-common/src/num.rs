//! Traits for bit-level access to integer types

use std::ops::RangeInclusive;

pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;

    #[must_use]
    fn bits(self, range: RangeInclusive<u8>) -> Self;
}

macro_rules! impl_get_bit {
    ($t:ty) => {
        impl GetBit for $t {
            #[inline]
            fn bit(self, i: u8) -> bool {
                debug_assert!(i < (<$t>::BITS as u8));
                self & (1 << i) != 0
            }

            #[inline]
            fn bits(self, range: RangeInclusive<u8>) -> Self {
                let start = *range.start();
                let end = *range.end();
                debug_assert!(end < (<$t>::BITS as u8));

                (self >> start) & ((1 << (end - start + 1)) - 1)
            }
        }
    };
}

impl_get_bit!(u8);
impl_get_bit!(u16);
impl_get_bit!(u32);
impl_get_bit!(u64);
impl_get_bit!(usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit() {
        assert!(0x40_u8.bit(6));
        assert!(!0x40_u8.bit(7));
        assert!(0x8000_u16.bit(15));
    }

    #[test]
    fn bits() {
        assert_eq!(0b101, 0b1010_1000_u8.bits(3..=5));
        assert_eq!(0x1F, 0xFF_u8.bits(0..=4));
    }
}
