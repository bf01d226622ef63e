//! Helpers for the small term grammars shared by keys and signatures,
//! e.g. `(curve p256)` or `(x |...|)`.

use num_bigint::BigUint;
use spki_sexp::Sexp;

/// `(name value)` with an atom value.
pub(crate) fn term(name: &str, value: impl AsRef<[u8]>) -> Sexp {
    Sexp::list(vec![Sexp::atom(name), Sexp::atom(value)])
}

/// Minimal big-endian octets; zero encodes as the empty string.
pub(crate) fn uint_bytes(n: &BigUint) -> Vec<u8> {
    if n.bits() == 0 {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}

pub(crate) fn uint_term(name: &str, n: &BigUint) -> Sexp {
    term(name, uint_bytes(n))
}

/// The elements of `sexp` if it is a list led by the atom `name`.
pub(crate) fn tagged<'a>(sexp: &'a Sexp, name: &str) -> Option<&'a [Sexp]> {
    sexp.as_list()
        .filter(|items| items.first().map_or(false, |head| head.is_atom(name)))
}

/// The atom value of a `(name VALUE)` term.
pub(crate) fn named_atom<'a>(name: &str, sexp: &'a Sexp) -> Result<&'a [u8], String> {
    match sexp.as_list() {
        Some([head, value]) if head.is_atom(name) => value
            .atom_bytes()
            .ok_or_else(|| format!("value in ({} VALUE) must be an atom", name)),
        _ => Err(format!("expected term ({} OCTET-STRING)", name)),
    }
}

/// A `(name OCTETS)` term read as an unsigned big-endian integer.
pub(crate) fn named_uint(name: &str, sexp: &Sexp) -> Result<BigUint, String> {
    named_atom(name, sexp).map(BigUint::from_bytes_be)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_bytes_minimal() {
        assert_eq!(uint_bytes(&BigUint::from(0u8)), Vec::<u8>::new());
        assert_eq!(uint_bytes(&BigUint::from(0x0102u16)), vec![1, 2]);
    }

    #[test]
    fn test_named_uint() {
        let t = Sexp::list(vec![Sexp::atom("x"), Sexp::atom([0, 0, 7])]);
        assert_eq!(named_uint("x", &t).unwrap(), BigUint::from(7u8));
        assert!(named_uint("y", &t).is_err());
        assert!(named_uint("x", &Sexp::atom("x")).is_err());

        let nested = Sexp::list(vec![Sexp::atom("x"), Sexp::list(vec![])]);
        assert!(named_uint("x", &nested).is_err());
    }

    #[test]
    fn test_tagged() {
        let s = Sexp::list(vec![Sexp::atom("cert"), Sexp::atom("a")]);
        assert_eq!(tagged(&s, "cert").map(<[Sexp]>::len), Some(2));
        assert!(tagged(&s, "hash").is_none());
        assert!(tagged(&Sexp::list(vec![]), "cert").is_none());
    }
}
