//! Which role goes in which slot of a shape.
//!
//! Shapes emit points in a fixed order (perimeter first, centre first, tip
//! first, ...), so ordering only has to decide the role sequence.

use std::collections::VecDeque;

use super::{FormationShape, FormationUnit, Role};

pub(super) fn order_units(shape: FormationShape, units: Vec<FormationUnit>) -> Vec<FormationUnit> {
    if shape == FormationShape::PoissonDisc {
        return units;
    }
    let (melee, ranged): (VecDeque<_>, VecDeque<_>) =
        units.into_iter().partition(|u| u.role == Role::Melee);

    match shape {
        FormationShape::Line | FormationShape::Grid | FormationShape::Arc => concat(melee, ranged),
        FormationShape::Diamond | FormationShape::Cluster => concat(ranged, melee),
        FormationShape::Circle => alternate(melee, ranged, |slot| slot % 2 == 0),
        FormationShape::Cross => {
            if melee.len() == 1 && ranged.len() != 1 {
                concat(melee, ranged)
            } else {
                concat(ranged, melee)
            }
        }
        FormationShape::Wedge => alternate(melee, ranged, |slot| slot == 0 || slot % 2 == 1),
        FormationShape::PoissonDisc => concat(melee, ranged),
    }
}

fn concat(
    mut first: VecDeque<FormationUnit>,
    second: VecDeque<FormationUnit>,
) -> Vec<FormationUnit> {
    first.extend(second);
    first.into()
}

/// Fills slot `i` with melee when `wants_melee(i)`, taking from the other
/// role once the preferred one runs out.
fn alternate(
    mut melee: VecDeque<FormationUnit>,
    mut ranged: VecDeque<FormationUnit>,
    wants_melee: impl Fn(usize) -> bool,
) -> Vec<FormationUnit> {
    let total = melee.len() + ranged.len();
    let mut ordered = Vec::with_capacity(total);
    for slot in 0..total {
        let (preferred, other) = if wants_melee(slot) {
            (&mut melee, &mut ranged)
        } else {
            (&mut ranged, &mut melee)
        };
        if let Some(unit) = preferred.pop_front().or_else(|| other.pop_front()) {
            ordered.push(unit);
        }
    }
    ordered
}
