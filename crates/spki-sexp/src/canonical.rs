//! Canonical S-expression encoding.
//!
//! The canonical form is the unique byte string hashed and signed by SPKI:
//! - Atoms are `<decimal length>:<bytes>` with no leading zeros
//! - Display hints are `[<atom>]` immediately before the atom they qualify
//! - Lists are `(` followed by their elements and `)`
//! - No whitespace anywhere
//!
//! Two structurally equal expressions always pack to identical bytes.

use crate::sexp::{Atom, Sexp};

/// Encode an expression to canonical bytes.
pub fn pack(sexp: &Sexp) -> Vec<u8> {
    let mut buf = Vec::new();
    pack_to(&mut buf, sexp);
    buf
}

/// Recursively encode an expression.
fn pack_to(buf: &mut Vec<u8>, sexp: &Sexp) {
    match sexp {
        Sexp::Atom(atom) => pack_atom(buf, atom),
        Sexp::List(items) => {
            buf.push(b'(');
            for item in items {
                pack_to(buf, item);
            }
            buf.push(b')');
        }
    }
}

fn pack_atom(buf: &mut Vec<u8>, atom: &Atom) {
    if let Some(hint) = &atom.hint {
        buf.push(b'[');
        pack_octets(buf, hint);
        buf.push(b']');
    }
    pack_octets(buf, &atom.value);
}

/// Encode a verbatim octet string.
fn pack_octets(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(bytes.len().to_string().as_bytes());
    buf.push(b':');
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_atom() {
        assert_eq!(pack(&Sexp::atom("hash")), b"4:hash".to_vec());
        assert_eq!(pack(&Sexp::atom("")), b"0:".to_vec());
    }

    #[test]
    fn test_pack_nested_list() {
        let s = Sexp::list(vec![
            Sexp::atom("cert"),
            Sexp::list(vec![Sexp::atom("delegate")]),
            Sexp::list(vec![]),
        ]);
        assert_eq!(pack(&s), b"(4:cert(8:delegate)())".to_vec());
    }

    #[test]
    fn test_pack_hint() {
        let s = Sexp::hinted("text/plain", "hi");
        assert_eq!(pack(&s), b"[10:text/plain]2:hi".to_vec());
    }

    #[test]
    fn test_pack_long_atom_length_prefix() {
        let value = vec![0x42u8; 1234];
        let packed = pack(&Sexp::atom(&value));
        assert!(packed.starts_with(b"1234:"));
        assert_eq!(packed.len(), 5 + 1234);
    }

    #[test]
    fn test_pack_deterministic() {
        let s = Sexp::list(vec![Sexp::atom("a"), Sexp::atom([0u8, 1, 2])]);
        assert_eq!(pack(&s), pack(&s.clone()));
    }
}
