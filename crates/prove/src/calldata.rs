//! Symbolic calldata construction
//!
//! Every declared input becomes a fresh symbolic variable constrained by
//! a type-range predicate. Range generation is best-effort: an input
//! whose type we cannot characterize keeps its variable but loses its
//! constraint, with a warning. Dynamic arrays are the one hard failure —
//! a symbolic loop bound would make analysis nondeterministic, so an
//! unresolvable element count aborts construction.

use crate::contract::Method;
use crate::{Error, Result};
use athanor_core::term::{FreshVars, Term};
use std::collections::BTreeMap;

/// Optional exact-length annotations for dynamic parameters, keyed by
/// parameter name.
pub type LengthBounds = BTreeMap<String, usize>;

/// The symbolic calldata cell plus the constraints its variables carry.
#[derive(Debug, Clone)]
pub struct SymbolicCalldata {
    /// Opaque encoded-arguments term for the `callData` cell.
    pub term: Term,
    /// Type-range constraints over the argument variables.
    pub constraints: Vec<Term>,
}

/// Builds symbolic calldata for a method call. Constructors pass
/// `with_selector = false`: their arguments are appended to the init
/// bytecode rather than selector-dispatched.
pub fn symbolic_calldata(
    method: &Method,
    bounds: &LengthBounds,
    fresh: &mut FreshVars,
    with_selector: bool,
) -> Result<SymbolicCalldata> {
    let mut args: Vec<Term> = Vec::with_capacity(method.inputs.len() + 1);
    let mut constraints = Vec::new();
    if with_selector {
        args.push(Term::Bytes(method.selector().to_vec()));
    }

    for (index, input) in method.inputs.iter().enumerate() {
        let base = if input.name.is_empty() {
            format!("V{index}")
        } else {
            format!("V{index}_{}", sanitize(&input.name))
        };
        let ty = input.ty.as_str();

        if let Some((element, count)) = array_type(ty) {
            // Arrays flatten into one variable per element; the element
            // count must be statically known.
            let count = match count {
                Some(fixed) => fixed,
                None => *bounds.get(input.name.as_str()).ok_or_else(|| {
                    Error::MissingLengthBound {
                        method: method.signature(),
                        parameter: input.name.clone(),
                    }
                })?,
            };
            let mut elements = Vec::with_capacity(count);
            for position in 0..count {
                let var = Term::var(fresh.fresh(&format!("{base}_{position}_")));
                if let Some(range) = range_predicate(element, &var, None) {
                    constraints.push(range);
                } else {
                    tracing::warn!(
                        method = %method.signature(),
                        parameter = %input.name,
                        ty = element,
                        "no range predicate for array element type, leaving unconstrained"
                    );
                }
                elements.push(var);
            }
            args.push(Term::App("list".into(), elements));
            continue;
        }

        let var = Term::var(fresh.fresh(&format!("{base}_")));
        let pinned = bounds.get(input.name.as_str()).copied();
        match range_predicate(ty, &var, pinned) {
            Some(range) => constraints.push(range),
            None => tracing::warn!(
                method = %method.signature(),
                parameter = %input.name,
                ty,
                "unsupported ABI type, argument left unconstrained"
            ),
        }
        args.push(var);
    }

    Ok(SymbolicCalldata {
        term: Term::App("encodeArgs".into(), args),
        constraints,
    })
}

/// Splits `T[]` / `T[k]` into the element type and the optional fixed
/// count.
fn array_type(ty: &str) -> Option<(&str, Option<usize>)> {
    let open = ty.rfind('[')?;
    if !ty.ends_with(']') {
        return None;
    }
    let element = &ty[..open];
    let inner = &ty[open + 1..ty.len() - 1];
    if inner.is_empty() {
        Some((element, None))
    } else {
        inner.parse().ok().map(|count| (element, Some(count)))
    }
}

/// The range predicate for one scalar ABI type, or `None` when the type
/// is unsupported. `pinned` carries an exact-length annotation for
/// dynamic `bytes`/`string` values.
fn range_predicate(ty: &str, var: &Term, pinned: Option<usize>) -> Option<Term> {
    match ty {
        "address" => Some(Term::unsigned_range(var.clone(), 160)),
        "bool" => Some(Term::unsigned_range(var.clone(), 1)),
        "bytes" | "string" => {
            // Dynamic byte-strings are optionally pinned to an exact
            // length; otherwise only well-formedness is required.
            let length = Term::App("lengthBytes".into(), vec![var.clone()]);
            Some(match pinned {
                Some(exact) => Term::eq_int(length, Term::int(exact)),
                None => Term::le_int(Term::int(0u8), length),
            })
        }
        _ => {
            if let Some(bits) = ty.strip_prefix("uint") {
                let bits: u32 = if bits.is_empty() { 256 } else { bits.parse().ok()? };
                return Some(Term::unsigned_range(var.clone(), bits));
            }
            if let Some(bits) = ty.strip_prefix("int") {
                let bits: u32 = if bits.is_empty() { 256 } else { bits.parse().ok()? };
                return Some(Term::App(
                    "rangeSInt".into(),
                    vec![Term::int(bits), var.clone()],
                ));
            }
            if let Some(width) = ty.strip_prefix("bytes") {
                let width: u32 = width.parse().ok()?;
                if (1..=32).contains(&width) {
                    return Some(Term::unsigned_range(var.clone(), width * 8));
                }
            }
            None
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
