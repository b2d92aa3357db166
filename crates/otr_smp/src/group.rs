//! The 1536-bit prime-order subgroup SMP runs over (§4.4: "the same 1536-bit
//! prime `p` from the OTR spec"), reusing `otr_crypto::dh`'s group rather
//! than defining a second copy of the same constants.

use otr_crypto::dh::{generator, p, q, random_below, validate_group_element, validate_scalar};
use otr_crypto::BigUint;
use rand::RngCore;

use crate::error::SmpError;

pub fn g1() -> BigUint {
    generator()
}

pub fn modulus() -> BigUint {
    p()
}

pub fn order() -> BigUint {
    q()
}

pub fn random_exponent<R: RngCore>(rng: &mut R) -> BigUint {
    random_below(rng, &q())
}

pub fn check_group_element(value: &BigUint) -> Result<(), SmpError> {
    validate_group_element(value).map_err(|_| SmpError::RangeCheck)
}

pub fn check_scalar(value: &BigUint) -> Result<(), SmpError> {
    validate_scalar(value).map_err(|_| SmpError::RangeCheck)
}

/// `base^-1 mod p`, via Fermat's little theorem (`p` is prime).
pub fn inverse(base: &BigUint) -> BigUint {
    base.modpow(&(p() - BigUint::from(2u8)), &p())
}

/// `a / b mod p`.
pub fn divide(a: &BigUint, b: &BigUint) -> BigUint {
    (a * inverse(b)) % p()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_of_generator_times_generator_is_one() {
        let g = g1();
        assert_eq!((&g * inverse(&g)) % modulus(), BigUint::from(1u8));
    }

    #[test]
    fn divide_then_multiply_recovers_original() {
        let a = BigUint::from(123456789u64);
        let b = BigUint::from(987654321u64);
        let q = divide(&a, &b);
        assert_eq!((&q * &b) % modulus(), a % modulus());
    }
}
