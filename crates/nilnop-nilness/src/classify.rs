//! Nilness of a single value under a stack of dominating facts.

use nilnop_ir::ir::{Function, ValueId, ValueKind};

use crate::facts::FactStack;
use crate::lattice::Nilness;

/// Whether `value` is definitely nil, definitely non-nil, or unknown given
/// the facts that dominate the current block.
///
/// Rules, first match wins:
/// 1. Interface changes and reslices take the nilness of their operand
///    when that is known.
/// 2. A slice-to-array-pointer conversion with a non-zero length is
///    non-nil, except that converting a nil slice panics, so that case is
///    left unknown. With a zero length the operand decides when it is
///    known.
/// 3. Allocations, addresses, globals, functions, closures and the `make*`
///    family are non-nil.
/// 4. A nil constant is nil; any other constant is unknown.
/// 5. Otherwise the newest fact about `value`, if any.
pub fn classify(func: &Function, stack: &FactStack, value: ValueId) -> Nilness {
    classify_within(func, stack, value, func.values.len())
}

/// The operand chain is followed with a loop and resolved from the innermost
/// value outward. It is bounded by the number of values so a
/// self-referencing value in malformed input cannot loop.
fn classify_within(func: &Function, stack: &FactStack, id: ValueId, depth: usize) -> Nilness {
    let mut chain = vec![id];
    let mut current = id;
    while chain.len() <= depth {
        let Some(value) = func.value(current) else {
            break;
        };
        match &value.kind {
            ValueKind::ChangeInterface { x }
            | ValueKind::Slice { x }
            | ValueKind::SliceToArrayPointer { x, .. } => {
                current = *x;
                chain.push(current);
            }
            _ => break,
        }
    }

    let mut nilness = intrinsic(func, stack, current);
    for &outer in chain.iter().rev().skip(1) {
        let Some(value) = func.value(outer) else {
            return Nilness::Unknown;
        };
        nilness = match &value.kind {
            ValueKind::SliceToArrayPointer { len, .. } if *len > 0 => match nilness {
                Nilness::Nil => Nilness::Unknown,
                _ => Nilness::NonNil,
            },
            _ if nilness.is_known() => nilness,
            _ => intrinsic(func, stack, outer),
        };
    }
    nilness
}

/// Nilness of `id` itself, without looking through its operand.
fn intrinsic(func: &Function, stack: &FactStack, id: ValueId) -> Nilness {
    let Some(value) = func.value(id) else {
        return Nilness::Unknown;
    };
    match &value.kind {
        ValueKind::Alloc
        | ValueKind::FieldAddr
        | ValueKind::FreeVar
        | ValueKind::Function
        | ValueKind::Global
        | ValueKind::IndexAddr
        | ValueKind::MakeChan
        | ValueKind::MakeClosure
        | ValueKind::MakeInterface
        | ValueKind::MakeMap
        | ValueKind::MakeSlice => Nilness::NonNil,
        ValueKind::Const { is_nil: true, .. } => Nilness::Nil,
        ValueKind::Const { .. } => Nilness::Unknown,
        _ => stack.lookup(id).unwrap_or(Nilness::Unknown),
    }
}
